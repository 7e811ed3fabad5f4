// cleanplate-server/src/uploads.rs

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use cleanplate_core::Error;

/// Allowed plate photo extensions, matching what the upload form accepts.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Thin local-disk stand-in for the external binary store. The rest of the
/// system only ever sees the returned `/uploads/...` reference.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Persist an uploaded image under a fresh, non-guessable name and
    /// return its public reference.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, Error> {
        if bytes.is_empty() {
            return Err(Error::Validation("No image uploaded.".into()));
        }

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| Error::Validation("Only image files are allowed.".into()))?;

        let filename = format!("plate-{}.{}", Uuid::new_v4().simple(), extension);

        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(&filename), bytes).await?;

        Ok(format!("/uploads/{}", filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_bytes_under_a_fresh_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        let reference = store.store("my plate.JPG", b"fake-image-bytes").await.unwrap();
        assert!(reference.starts_with("/uploads/plate-"));
        assert!(reference.ends_with(".jpg"));

        let filename = reference.strip_prefix("/uploads/").unwrap();
        let on_disk = tokio::fs::read(dir.path().join(filename)).await.unwrap();
        assert_eq!(on_disk, b"fake-image-bytes");
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        let err = store.store("script.sh", b"#!/bin/sh").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = store.store("plate.jpg", b"").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
