// File: cleanplate-core/src/services/mod.rs

pub mod eligibility_service;
pub mod reward_service;
pub mod verification_service;

pub use eligibility_service::{Eligibility, EligibilityService, RemainingTime};
pub use reward_service::{ClaimReceipt, ClaimRequest, OfferBoard, RewardService, ScanMetrics};
pub use verification_service::{
    ScanStatusView, UploadPlateRequest, VerificationOutcome, VerificationService,
};
