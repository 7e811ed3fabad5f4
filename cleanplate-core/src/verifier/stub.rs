// File: cleanplate-core/src/verifier/stub.rs

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use cleanplate_common::traits::verifier_traits::{PlateVerdict, PlateVerifier};
use crate::Error;

/// Placeholder verifier until a real vision model is integrated: approves
/// every plate after a simulated processing delay. It goes through the same
/// `PlateVerifier` seam as any future classifier would; nothing else in the
/// system knows it is a stub.
pub struct StubPlateVerifier {
    processing_delay: Duration,
}

impl StubPlateVerifier {
    pub fn new() -> Self {
        Self {
            processing_delay: Duration::from_millis(1500),
        }
    }

    /// Tests zero this out.
    pub fn with_delay(processing_delay: Duration) -> Self {
        Self { processing_delay }
    }
}

impl Default for StubPlateVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlateVerifier for StubPlateVerifier {
    async fn verify(&self, image_ref: &str) -> Result<PlateVerdict, Error> {
        let filename = image_ref.rsplit('/').next().unwrap_or(image_ref);

        tokio::time::sleep(self.processing_delay).await;

        info!("plate verification: image={} result=approved", filename);
        Ok(PlateVerdict::Approved)
    }
}
