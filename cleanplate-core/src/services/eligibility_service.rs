use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use cleanplate_common::models::Scan;
use cleanplate_common::traits::repository_traits::ScanRepository;
use crate::Error;

/// Countdown breakdown for clients that render "try again in Xh Ym".
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RemainingTime {
    pub hours: i64,
    pub minutes: i64,
}

/// Answer from the eligibility gate. A negative answer always carries the
/// exact threshold instant.
#[derive(Debug, Clone, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<RemainingTime>,
}

impl Eligibility {
    fn yes() -> Self {
        Self {
            eligible: true,
            next_available_at: None,
            remaining: None,
        }
    }
}

/// Decides whether a device may attempt a scan or claim. Only the most
/// recent *approved* scan establishes a cooldown; rejected or abandoned
/// attempts never block a retry.
pub struct EligibilityService {
    scan_repo: Arc<dyn ScanRepository>,
}

impl EligibilityService {
    pub fn new(scan_repo: Arc<dyn ScanRepository>) -> Self {
        Self { scan_repo }
    }

    /// Read-only check, safe to call freely. Does not by itself prevent a
    /// race at claim time; the claim engine re-checks.
    pub async fn check_eligibility(&self, fingerprint: &str) -> Result<Eligibility, Error> {
        if fingerprint.trim().is_empty() {
            return Err(Error::Validation("Device identifier is required.".into()));
        }

        let latest = self
            .scan_repo
            .latest_approved_for_fingerprint(fingerprint)
            .await?;

        let answer = evaluate(latest.as_ref(), Utc::now());
        debug!(
            "eligibility for fingerprint: eligible={} next_available_at={:?}",
            answer.eligible, answer.next_available_at
        );
        Ok(answer)
    }

    /// Same rule as a hard gate: `Err(RateLimited)` while the cooldown is
    /// active. Used by upload and claim before doing any work.
    pub async fn ensure_eligible(&self, fingerprint: &str) -> Result<(), Error> {
        let answer = self.check_eligibility(fingerprint).await?;
        match answer.next_available_at {
            Some(next_available_at) if !answer.eligible => {
                Err(Error::RateLimited { next_available_at })
            }
            _ => Ok(()),
        }
    }
}

/// The gate rule itself, as-of `now`: no approved scan, or a threshold that
/// has passed, means eligible.
fn evaluate(latest_approved: Option<&Scan>, now: DateTime<Utc>) -> Eligibility {
    let Some(scan) = latest_approved else {
        return Eligibility::yes();
    };

    match scan.next_scan_available_at {
        Some(next) if next > now => {
            let remaining_minutes = (next - now).num_minutes();
            Eligibility {
                eligible: false,
                next_available_at: Some(next),
                remaining: Some(RemainingTime {
                    hours: remaining_minutes / 60,
                    minutes: remaining_minutes % 60,
                }),
            }
        }
        _ => Eligibility::yes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    use cleanplate_common::models::VerificationStatus;

    fn approved_scan(next_available_at: Option<DateTime<Utc>>) -> Scan {
        let now = Utc::now();
        Scan {
            scan_id: Uuid::new_v4(),
            restaurant_id: None,
            shop_id: None,
            item_id: None,
            original_price: 0,
            discounted_price: 0,
            discount_amount: 0,
            guest_name: None,
            plate_image_url: None,
            device_fingerprint: Some("fp".into()),
            verification_status: VerificationStatus::Approved,
            reward_unlocked: true,
            next_scan_available_at: next_available_at,
            scanned_at: now,
            verified_at: Some(now),
        }
    }

    #[test]
    fn no_prior_scan_is_eligible() {
        let answer = evaluate(None, Utc::now());
        assert!(answer.eligible);
        assert!(answer.next_available_at.is_none());
    }

    #[test]
    fn active_cooldown_blocks_and_reports_threshold() {
        let now = Utc::now();
        let next = now + Duration::hours(5) + Duration::minutes(30);
        let scan = approved_scan(Some(next));

        let answer = evaluate(Some(&scan), now);
        assert!(!answer.eligible);
        assert_eq!(answer.next_available_at, Some(next));
        let remaining = answer.remaining.expect("remaining should be set");
        assert_eq!(remaining.hours, 5);
        assert_eq!(remaining.minutes, 30);
    }

    #[test]
    fn eligibility_flips_exactly_at_threshold() {
        let now = Utc::now();
        let scan = approved_scan(Some(now));

        // now >= threshold: eligible again
        assert!(evaluate(Some(&scan), now).eligible);
        // one second before the threshold: still blocked
        assert!(!evaluate(Some(&scan), now - Duration::seconds(1)).eligible);
    }

    #[test]
    fn approved_scan_without_cooldown_is_eligible() {
        let scan = approved_scan(None);
        assert!(evaluate(Some(&scan), Utc::now()).eligible);
    }
}
