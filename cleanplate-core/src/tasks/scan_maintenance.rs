// src/tasks/scan_maintenance.rs

use tracing::info;

use cleanplate_common::traits::repository_traits::ScanRepository;
use crate::Error;

/// Run on startup to repair scan rows written by older builds that set a
/// cooldown on non-approved scans. Only approved scans may carry
/// `next_scan_available_at`; anything else would wrongly block retries
/// after a failed verification.
pub async fn run_scan_maintenance(scan_repo: &dyn ScanRepository) -> Result<(), Error> {
    let repaired = scan_repo.clear_stray_cooldowns().await?;
    if repaired > 0 {
        info!(
            "cleared stray cooldowns from {} non-approved scan(s); affected devices can retry",
            repaired
        );
    }

    let census = scan_repo.status_census().await?;
    info!(
        "scan census: approved={} pending={} rejected={} total={}",
        census.approved,
        census.pending,
        census.rejected,
        census.approved + census.pending + census.rejected
    );

    Ok(())
}
