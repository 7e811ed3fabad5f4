use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use cleanplate_common::models::{Scan, VerificationStatus, SCAN_COOLDOWN_HOURS};
use cleanplate_common::traits::repository_traits::{
    ItemRepository, RestaurantRepository, ScanRepository, ShopRepository,
};
use cleanplate_common::traits::verifier_traits::PlateVerifier;
use crate::services::eligibility_service::EligibilityService;
use crate::Error;

/// Input for the upload step. The image has already been placed in the
/// external binary store; `image_url` is its reference.
#[derive(Debug, Clone)]
pub struct UploadPlateRequest {
    pub image_url: String,
    pub device_fingerprint: String,
    /// Re-use an existing pending scan instead of creating a new one.
    pub scan_id: Option<Uuid>,
    pub restaurant_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub scan_id: Uuid,
    pub status: VerificationStatus,
    pub reward_unlocked: bool,
}

/// A scan joined with the display names a polling client wants.
#[derive(Debug, Clone, Serialize)]
pub struct ScanStatusView {
    pub scan: Scan,
    pub restaurant_name: Option<String>,
    pub shop_name: Option<String>,
    pub item_name: Option<String>,
}

/// Owns the upload-then-verify flow. Depends on `PlateVerifier` only through
/// the trait so the stub can be swapped for a real classifier.
pub struct VerificationService {
    scan_repo: Arc<dyn ScanRepository>,
    shop_repo: Arc<dyn ShopRepository>,
    item_repo: Arc<dyn ItemRepository>,
    restaurant_repo: Arc<dyn RestaurantRepository>,
    eligibility: Arc<EligibilityService>,
    verifier: Arc<dyn PlateVerifier>,
}

impl VerificationService {
    pub fn new(
        scan_repo: Arc<dyn ScanRepository>,
        shop_repo: Arc<dyn ShopRepository>,
        item_repo: Arc<dyn ItemRepository>,
        restaurant_repo: Arc<dyn RestaurantRepository>,
        eligibility: Arc<EligibilityService>,
        verifier: Arc<dyn PlateVerifier>,
    ) -> Self {
        Self {
            scan_repo,
            shop_repo,
            item_repo,
            restaurant_repo,
            eligibility,
            verifier,
        }
    }

    /// Record an uploaded plate image as a pending scan. The cooldown is
    /// enforced here, before the verifier is ever involved.
    pub async fn upload_plate(&self, req: UploadPlateRequest) -> Result<Scan, Error> {
        // 1) Validate input
        if req.device_fingerprint.trim().is_empty() {
            return Err(Error::Validation("Device identifier is required.".into()));
        }
        if req.image_url.trim().is_empty() {
            return Err(Error::Validation("No image uploaded.".into()));
        }

        // 2) Enforce the cooldown before any work happens
        self.eligibility
            .ensure_eligible(&req.device_fingerprint)
            .await?;

        let now = Utc::now();

        // 3) Re-use the caller's pending scan, or open a new one
        if let Some(scan_id) = req.scan_id {
            let existing = self
                .scan_repo
                .get_scan_by_id(scan_id)
                .await?
                .ok_or_else(|| Error::NotFound("Scan not found.".into()))?;

            if existing.verification_status.is_terminal() {
                return Err(Error::Conflict(
                    "Scan has already been verified and cannot accept a new image.".into(),
                ));
            }

            return self
                .scan_repo
                .attach_upload(scan_id, &req.image_url, &req.device_fingerprint, now)
                .await?
                .ok_or_else(|| {
                    Error::Conflict(
                        "Scan has already been verified and cannot accept a new image.".into(),
                    )
                });
        }

        // Shop/item/restaurant references are optional for standalone
        // verification; prices stay zero until a claim resolves them.
        let scan = Scan {
            scan_id: Uuid::new_v4(),
            restaurant_id: req.restaurant_id,
            shop_id: req.shop_id,
            item_id: req.item_id,
            original_price: 0,
            discounted_price: 0,
            discount_amount: 0,
            guest_name: None,
            plate_image_url: Some(req.image_url.clone()),
            device_fingerprint: Some(req.device_fingerprint.clone()),
            verification_status: VerificationStatus::Pending,
            reward_unlocked: false,
            next_scan_available_at: None,
            scanned_at: now,
            verified_at: None,
        };
        self.scan_repo.create_scan(&scan).await?;

        info!("opened pending scan {} for plate verification", scan.scan_id);
        Ok(scan)
    }

    /// Run the plate verifier over a pending scan and finalize it.
    ///
    /// Approval sets the reward and starts the cooldown; rejection leaves
    /// the device free to retry immediately. A verifier failure propagates
    /// without touching the row, so the scan stays pending and verify can
    /// safely be called again. Re-verifying a terminal scan is a conflict.
    pub async fn verify_scan(&self, scan_id: Uuid) -> Result<VerificationOutcome, Error> {
        // 1) Load and validate the scan
        let scan = self
            .scan_repo
            .get_scan_by_id(scan_id)
            .await?
            .ok_or_else(|| Error::NotFound("Scan not found.".into()))?;

        let image_url = scan
            .plate_image_url
            .as_deref()
            .ok_or_else(|| Error::Validation("No plate image uploaded.".into()))?;

        if scan.verification_status.is_terminal() {
            return Err(Error::Conflict("Scan has already been verified.".into()));
        }

        // 2) Judge the plate
        let verdict = self.verifier.verify(image_url).await?;

        // 3) Finalize; the cooldown starts only on approval
        let now = Utc::now();
        let (status, next_scan_available_at) = if verdict.is_approved() {
            (
                VerificationStatus::Approved,
                Some(now + Duration::hours(SCAN_COOLDOWN_HOURS)),
            )
        } else {
            (VerificationStatus::Rejected, None)
        };

        let finalized = self
            .scan_repo
            .finalize_verification(scan_id, status, now, next_scan_available_at)
            .await?;
        if !finalized {
            // Lost the race against a concurrent verify call.
            warn!("scan {} was finalized concurrently", scan_id);
            return Err(Error::Conflict("Scan has already been verified.".into()));
        }

        info!("scan {} verified: {}", scan_id, status);
        Ok(VerificationOutcome {
            scan_id,
            status,
            reward_unlocked: status == VerificationStatus::Approved,
        })
    }

    /// Current state of a scan, joined with display names, for client
    /// polling.
    pub async fn scan_status(&self, scan_id: Uuid) -> Result<ScanStatusView, Error> {
        let scan = self
            .scan_repo
            .get_scan_by_id(scan_id)
            .await?
            .ok_or_else(|| Error::NotFound("Scan not found.".into()))?;

        let restaurant_name = match scan.restaurant_id {
            Some(id) => self
                .restaurant_repo
                .get_restaurant_by_id(id)
                .await?
                .map(|r| r.name),
            None => None,
        };
        let shop_name = match scan.shop_id {
            Some(id) => self.shop_repo.get_shop_by_id(id).await?.map(|s| s.name),
            None => None,
        };
        let item_name = match scan.item_id {
            Some(id) => self.item_repo.get_item_by_id(id).await?.map(|i| i.name),
            None => None,
        };

        Ok(ScanStatusView {
            scan,
            restaurant_name,
            shop_name,
            item_name,
        })
    }
}
