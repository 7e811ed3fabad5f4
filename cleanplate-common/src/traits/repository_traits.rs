use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Item, Restaurant, Scan, ScanCensus, ScanOverview, ScanTotals, Shop, VerificationStatus};

#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn create_scan(&self, scan: &Scan) -> Result<(), Error>;

    async fn get_scan_by_id(&self, scan_id: Uuid) -> Result<Option<Scan>, Error>;

    /// The newest approved scan for a device fingerprint, i.e. the row that
    /// decides the eligibility gate. Rejected and pending scans never count.
    async fn latest_approved_for_fingerprint(&self, fingerprint: &str) -> Result<Option<Scan>, Error>;

    /// Attach a fresh plate image to an existing pending scan, refreshing
    /// `scanned_at`. Returns the updated row, or `None` when the scan was no
    /// longer pending at update time.
    async fn attach_upload(
        &self,
        scan_id: Uuid,
        image_url: &str,
        fingerprint: &str,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<Scan>, Error>;

    /// Move a pending scan to a terminal status. `reward_unlocked` and the
    /// cooldown follow from the status. The update is guarded on the row
    /// still being pending; returns `false` when another caller already
    /// finalized it.
    async fn finalize_verification(
        &self,
        scan_id: Uuid,
        status: VerificationStatus,
        verified_at: DateTime<Utc>,
        next_scan_available_at: Option<DateTime<Utc>>,
    ) -> Result<bool, Error>;

    /// Newest scans first, joined with shop/item names for dashboards.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ScanOverview>, Error>;

    async fn totals(&self) -> Result<ScanTotals, Error>;

    async fn status_census(&self) -> Result<ScanCensus, Error>;

    /// Repair pass: strip `next_scan_available_at` from any non-approved
    /// scan carrying one. Returns how many rows were touched.
    async fn clear_stray_cooldowns(&self) -> Result<u64, Error>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn get_item_by_id(&self, item_id: Uuid) -> Result<Option<Item>, Error>;

    /// Items worth showing on the offer board: active, discount enabled,
    /// at least one unit left.
    async fn list_live_discounts_for_shops(&self, shop_ids: &[Uuid]) -> Result<Vec<Item>, Error>;

    /// Atomically take one unit, conditioned on the item still being active,
    /// discount-enabled and in stock at decrement time. Returns the row as
    /// priced at the instant of the reservation, or `None` when the
    /// condition failed (sold out / deactivated) — in which case nothing was
    /// mutated. Implementations must not read-then-write.
    async fn reserve_unit(&self, item_id: Uuid) -> Result<Option<Item>, Error>;

    /// Compensating rollback for `reserve_unit` when the claim cannot be
    /// completed after the decrement.
    async fn release_unit(&self, item_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn get_shop_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>, Error>;

    async fn list_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Shop>, Error>;
}

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn get_restaurant_by_id(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, Error>;

    /// The single configured restaurant, used when a caller does not name
    /// one.
    async fn get_default(&self) -> Result<Option<Restaurant>, Error>;
}
