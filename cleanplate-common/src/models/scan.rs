// File: cleanplate-common/src/models/scan.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hours a device must wait after an approved scan before it may earn
/// another reward.
pub const SCAN_COOLDOWN_HOURS: i64 = 24;

/// How far a scan has progressed through plate verification.
///
/// `Pending` is the only non-terminal state. Once a scan reaches `Approved`
/// or `Rejected` it never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(format!("unknown verification status '{}'", other)),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt at earning a reward, either through the upload-then-verify
/// flow (starts `Pending`) or the instant offer-claim flow (created already
/// `Approved`).
///
/// Price columns are snapshots taken at claim/verification time; later item
/// edits never touch them. `next_scan_available_at` is set only on the
/// transition to `Approved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub scan_id: Uuid,
    pub restaurant_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub original_price: i64,
    pub discounted_price: i64,
    pub discount_amount: i64,
    pub guest_name: Option<String>,
    pub plate_image_url: Option<String>,
    pub device_fingerprint: Option<String>,
    pub verification_status: VerificationStatus,
    pub reward_unlocked: bool,
    pub next_scan_available_at: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// A scan joined with the names a dashboard wants to show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOverview {
    pub scan_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub shop_name: Option<String>,
    pub item_name: Option<String>,
    pub discount_amount: i64,
}

/// Aggregate totals over the whole scan trail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanTotals {
    pub total_scans: i64,
    pub total_discount: i64,
}

/// Per-status counts, reported by the maintenance pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanCensus {
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<VerificationStatus>(), Ok(status));
        }
        assert!("verified".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!VerificationStatus::Pending.is_terminal());
        assert!(VerificationStatus::Approved.is_terminal());
        assert!(VerificationStatus::Rejected.is_terminal());
    }
}
