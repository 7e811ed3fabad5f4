// File: cleanplate-core/src/repositories/postgres/scans.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cleanplate_common::error::Error;
use cleanplate_common::models::{Scan, ScanCensus, ScanOverview, ScanTotals, VerificationStatus};
use cleanplate_common::traits::repository_traits::ScanRepository;

pub struct PostgresScanRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresScanRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn scan_from_row(r: &PgRow) -> Result<Scan, Error> {
        let status: String = r.try_get("verification_status")?;
        Ok(Scan {
            scan_id: r.try_get("scan_id")?,
            restaurant_id: r.try_get("restaurant_id")?,
            shop_id: r.try_get("shop_id")?,
            item_id: r.try_get("item_id")?,
            original_price: r.try_get("original_price")?,
            discounted_price: r.try_get("discounted_price")?,
            discount_amount: r.try_get("discount_amount")?,
            guest_name: r.try_get("guest_name")?,
            plate_image_url: r.try_get("plate_image_url")?,
            device_fingerprint: r.try_get("device_fingerprint")?,
            verification_status: status.parse().map_err(Error::Parse)?,
            reward_unlocked: r.try_get("reward_unlocked")?,
            next_scan_available_at: r.try_get("next_scan_available_at")?,
            scanned_at: r.try_get("scanned_at")?,
            verified_at: r.try_get("verified_at")?,
        })
    }
}

const SCAN_COLUMNS: &str = r#"
    scan_id,
    restaurant_id,
    shop_id,
    item_id,
    original_price,
    discounted_price,
    discount_amount,
    guest_name,
    plate_image_url,
    device_fingerprint,
    verification_status,
    reward_unlocked,
    next_scan_available_at,
    scanned_at,
    verified_at
"#;

#[async_trait]
impl ScanRepository for PostgresScanRepository {
    async fn create_scan(&self, scan: &Scan) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO scans (
                scan_id,
                restaurant_id,
                shop_id,
                item_id,
                original_price,
                discounted_price,
                discount_amount,
                guest_name,
                plate_image_url,
                device_fingerprint,
                verification_status,
                reward_unlocked,
                next_scan_available_at,
                scanned_at,
                verified_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
            "#,
        )
            .bind(scan.scan_id)
            .bind(scan.restaurant_id)
            .bind(scan.shop_id)
            .bind(scan.item_id)
            .bind(scan.original_price)
            .bind(scan.discounted_price)
            .bind(scan.discount_amount)
            .bind(&scan.guest_name)
            .bind(&scan.plate_image_url)
            .bind(&scan.device_fingerprint)
            .bind(scan.verification_status.as_str())
            .bind(scan.reward_unlocked)
            .bind(scan.next_scan_available_at)
            .bind(scan.scanned_at)
            .bind(scan.verified_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_scan_by_id(&self, scan_id: Uuid) -> Result<Option<Scan>, Error> {
        let row_opt = sqlx::query(&format!(
            "SELECT {SCAN_COLUMNS} FROM scans WHERE scan_id = $1"
        ))
            .bind(scan_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| Self::scan_from_row(&r)).transpose()
    }

    async fn latest_approved_for_fingerprint(&self, fingerprint: &str) -> Result<Option<Scan>, Error> {
        let row_opt = sqlx::query(&format!(
            r#"
            SELECT {SCAN_COLUMNS}
            FROM scans
            WHERE device_fingerprint = $1
              AND verification_status = 'approved'
            ORDER BY scanned_at DESC
            LIMIT 1
            "#
        ))
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| Self::scan_from_row(&r)).transpose()
    }

    async fn attach_upload(
        &self,
        scan_id: Uuid,
        image_url: &str,
        fingerprint: &str,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<Scan>, Error> {
        // Guarded on the row still being pending: terminal scans are part of
        // the audit trail and must never be re-opened.
        let row_opt = sqlx::query(&format!(
            r#"
            UPDATE scans
            SET plate_image_url = $2,
                device_fingerprint = $3,
                scanned_at = $4
            WHERE scan_id = $1
              AND verification_status = 'pending'
            RETURNING {SCAN_COLUMNS}
            "#
        ))
            .bind(scan_id)
            .bind(image_url)
            .bind(fingerprint)
            .bind(scanned_at)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| Self::scan_from_row(&r)).transpose()
    }

    async fn finalize_verification(
        &self,
        scan_id: Uuid,
        status: VerificationStatus,
        verified_at: DateTime<Utc>,
        next_scan_available_at: Option<DateTime<Utc>>,
    ) -> Result<bool, Error> {
        // reward_unlocked follows the status; the WHERE clause makes the
        // pending -> terminal transition single-winner under races.
        let reward_unlocked = status == VerificationStatus::Approved;

        let result = sqlx::query(
            r#"
            UPDATE scans
            SET verification_status = $2,
                reward_unlocked = $3,
                verified_at = $4,
                next_scan_available_at = $5
            WHERE scan_id = $1
              AND verification_status = 'pending'
            "#,
        )
            .bind(scan_id)
            .bind(status.as_str())
            .bind(reward_unlocked)
            .bind(verified_at)
            .bind(next_scan_available_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ScanOverview>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT
                sc.scan_id,
                sc.scanned_at,
                sc.discount_amount,
                sh.name AS shop_name,
                it.name AS item_name
            FROM scans sc
            LEFT JOIN shops sh ON sh.shop_id = sc.shop_id
            LEFT JOIN items it ON it.item_id = sc.item_id
            ORDER BY sc.scanned_at DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(ScanOverview {
                scan_id: r.try_get("scan_id")?,
                scanned_at: r.try_get("scanned_at")?,
                shop_name: r.try_get("shop_name")?,
                item_name: r.try_get("item_name")?,
                discount_amount: r.try_get("discount_amount")?,
            });
        }
        Ok(list)
    }

    async fn totals(&self) -> Result<ScanTotals, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_scans,
                COALESCE(SUM(discount_amount), 0)::BIGINT AS total_discount
            FROM scans
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        Ok(ScanTotals {
            total_scans: row.try_get("total_scans")?,
            total_discount: row.try_get("total_discount")?,
        })
    }

    async fn status_census(&self) -> Result<ScanCensus, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE verification_status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE verification_status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE verification_status = 'rejected') AS rejected
            FROM scans
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        Ok(ScanCensus {
            approved: row.try_get("approved")?,
            pending: row.try_get("pending")?,
            rejected: row.try_get("rejected")?,
        })
    }

    async fn clear_stray_cooldowns(&self) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE scans
            SET next_scan_available_at = NULL
            WHERE verification_status <> 'approved'
              AND next_scan_available_at IS NOT NULL
            "#,
        )
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
