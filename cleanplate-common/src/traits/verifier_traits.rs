use async_trait::async_trait;
use mockall::automock;

use crate::error::Error;

/// Verdict on a single plate photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateVerdict {
    Approved,
    Rejected,
}

impl PlateVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, PlateVerdict::Approved)
    }
}

/// The pluggable plate-cleanliness check.
///
/// The verification service depends only on this trait, so a real image
/// classifier can replace the stub without touching claim or scan logic. An
/// `Err` return means the judgement could not be made at all — the scan must
/// stay pending and the caller may retry.
#[automock]
#[async_trait]
pub trait PlateVerifier: Send + Sync {
    async fn verify(&self, image_ref: &str) -> Result<PlateVerdict, Error>;
}
