// File: cleanplate-core/tests/common/mod.rs
//
// In-memory repository fakes. Each method takes the lock once and does its
// whole read-modify-write inside it, so `reserve_unit` has the same
// conditional-decrement semantics the Postgres implementation gets from its
// guarded UPDATE.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use cleanplate_common::error::Error;
use cleanplate_common::models::{
    Item, Restaurant, Scan, ScanCensus, ScanOverview, ScanTotals, Shop, ShopStatus,
    VerificationStatus, SCAN_COOLDOWN_HOURS,
};
use cleanplate_common::traits::repository_traits::{
    ItemRepository, RestaurantRepository, ScanRepository, ShopRepository,
};

#[derive(Default)]
pub struct InMemoryScanRepository {
    scans: Mutex<HashMap<Uuid, Scan>>,
}

impl InMemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sync(&self, scan_id: Uuid) -> Option<Scan> {
        self.scans.lock().unwrap().get(&scan_id).cloned()
    }

    pub fn insert_sync(&self, scan: Scan) {
        self.scans.lock().unwrap().insert(scan.scan_id, scan);
    }
}

#[async_trait]
impl ScanRepository for InMemoryScanRepository {
    async fn create_scan(&self, scan: &Scan) -> Result<(), Error> {
        self.scans.lock().unwrap().insert(scan.scan_id, scan.clone());
        Ok(())
    }

    async fn get_scan_by_id(&self, scan_id: Uuid) -> Result<Option<Scan>, Error> {
        Ok(self.get_sync(scan_id))
    }

    async fn latest_approved_for_fingerprint(&self, fingerprint: &str) -> Result<Option<Scan>, Error> {
        let scans = self.scans.lock().unwrap();
        Ok(scans
            .values()
            .filter(|s| {
                s.device_fingerprint.as_deref() == Some(fingerprint)
                    && s.verification_status == VerificationStatus::Approved
            })
            .max_by_key(|s| s.scanned_at)
            .cloned())
    }

    async fn attach_upload(
        &self,
        scan_id: Uuid,
        image_url: &str,
        fingerprint: &str,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<Scan>, Error> {
        let mut scans = self.scans.lock().unwrap();
        match scans.get_mut(&scan_id) {
            Some(scan) if scan.verification_status == VerificationStatus::Pending => {
                scan.plate_image_url = Some(image_url.to_string());
                scan.device_fingerprint = Some(fingerprint.to_string());
                scan.scanned_at = scanned_at;
                Ok(Some(scan.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn finalize_verification(
        &self,
        scan_id: Uuid,
        status: VerificationStatus,
        verified_at: DateTime<Utc>,
        next_scan_available_at: Option<DateTime<Utc>>,
    ) -> Result<bool, Error> {
        let mut scans = self.scans.lock().unwrap();
        match scans.get_mut(&scan_id) {
            Some(scan) if scan.verification_status == VerificationStatus::Pending => {
                scan.verification_status = status;
                scan.reward_unlocked = status == VerificationStatus::Approved;
                scan.verified_at = Some(verified_at);
                scan.next_scan_available_at = next_scan_available_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ScanOverview>, Error> {
        let scans = self.scans.lock().unwrap();
        let mut all: Vec<&Scan> = scans.values().collect();
        all.sort_by_key(|s| std::cmp::Reverse(s.scanned_at));
        Ok(all
            .into_iter()
            .take(limit as usize)
            .map(|s| ScanOverview {
                scan_id: s.scan_id,
                scanned_at: s.scanned_at,
                shop_name: None,
                item_name: None,
                discount_amount: s.discount_amount,
            })
            .collect())
    }

    async fn totals(&self) -> Result<ScanTotals, Error> {
        let scans = self.scans.lock().unwrap();
        Ok(ScanTotals {
            total_scans: scans.len() as i64,
            total_discount: scans.values().map(|s| s.discount_amount).sum(),
        })
    }

    async fn status_census(&self) -> Result<ScanCensus, Error> {
        let scans = self.scans.lock().unwrap();
        let count = |status: VerificationStatus| {
            scans.values().filter(|s| s.verification_status == status).count() as i64
        };
        Ok(ScanCensus {
            approved: count(VerificationStatus::Approved),
            pending: count(VerificationStatus::Pending),
            rejected: count(VerificationStatus::Rejected),
        })
    }

    async fn clear_stray_cooldowns(&self) -> Result<u64, Error> {
        let mut scans = self.scans.lock().unwrap();
        let mut repaired = 0;
        for scan in scans.values_mut() {
            if scan.verification_status != VerificationStatus::Approved
                && scan.next_scan_available_at.is_some()
            {
                scan.next_scan_available_at = None;
                repaired += 1;
            }
        }
        Ok(repaired)
    }
}

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: Mutex<HashMap<Uuid, Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sync(&self, item: Item) {
        self.items.lock().unwrap().insert(item.item_id, item);
    }

    pub fn get_sync(&self, item_id: Uuid) -> Option<Item> {
        self.items.lock().unwrap().get(&item_id).cloned()
    }

    pub fn update_sync(&self, item_id: Uuid, f: impl FnOnce(&mut Item)) {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.get_mut(&item_id) {
            f(item);
        }
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn get_item_by_id(&self, item_id: Uuid) -> Result<Option<Item>, Error> {
        Ok(self.get_sync(item_id))
    }

    async fn list_live_discounts_for_shops(&self, shop_ids: &[Uuid]) -> Result<Vec<Item>, Error> {
        let items = self.items.lock().unwrap();
        let mut live: Vec<Item> = items
            .values()
            .filter(|i| {
                shop_ids.contains(&i.shop_id)
                    && i.is_active
                    && i.discount_active
                    && i.quantity_available > 0
            })
            .cloned()
            .collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(live)
    }

    async fn reserve_unit(&self, item_id: Uuid) -> Result<Option<Item>, Error> {
        let mut items = self.items.lock().unwrap();
        match items.get_mut(&item_id) {
            Some(item)
                if item.is_active && item.discount_active && item.quantity_available > 0 =>
            {
                item.quantity_available -= 1;
                item.updated_at = Utc::now();
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_unit(&self, item_id: Uuid) -> Result<(), Error> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.get_mut(&item_id) {
            item.quantity_available += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryShopRepository {
    shops: Mutex<HashMap<Uuid, Shop>>,
}

impl InMemoryShopRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sync(&self, shop: Shop) {
        self.shops.lock().unwrap().insert(shop.shop_id, shop);
    }
}

#[async_trait]
impl ShopRepository for InMemoryShopRepository {
    async fn get_shop_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>, Error> {
        Ok(self.shops.lock().unwrap().get(&shop_id).cloned())
    }

    async fn list_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Shop>, Error> {
        let shops = self.shops.lock().unwrap();
        let mut active: Vec<Shop> = shops
            .values()
            .filter(|s| s.restaurant_id == restaurant_id && s.status == ShopStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

#[derive(Default)]
pub struct InMemoryRestaurantRepository {
    restaurants: Mutex<Vec<Restaurant>>,
}

impl InMemoryRestaurantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sync(&self, restaurant: Restaurant) {
        self.restaurants.lock().unwrap().push(restaurant);
    }
}

#[async_trait]
impl RestaurantRepository for InMemoryRestaurantRepository {
    async fn get_restaurant_by_id(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, Error> {
        Ok(self
            .restaurants
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn get_default(&self) -> Result<Option<Restaurant>, Error> {
        Ok(self.restaurants.lock().unwrap().first().cloned())
    }
}

// ---------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------

pub fn sample_restaurant(name: &str) -> Restaurant {
    let now = Utc::now();
    Restaurant {
        restaurant_id: Uuid::new_v4(),
        name: name.to_string(),
        address: "1 Food Court Way".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_shop(restaurant_id: Uuid, name: &str, status: ShopStatus) -> Shop {
    let now = Utc::now();
    Shop {
        shop_id: Uuid::new_v4(),
        restaurant_id,
        name: name.to_string(),
        address: "Stall 12".to_string(),
        status,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_item(shop_id: Uuid, name: &str, quantity: i32, original: i64, discounted: i64) -> Item {
    let now = Utc::now();
    Item {
        item_id: Uuid::new_v4(),
        shop_id,
        name: name.to_string(),
        original_price: original,
        discounted_price: discounted,
        quantity_available: quantity,
        discount_active: true,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// An approved scan for a device, with an explicit cooldown threshold.
pub fn approved_scan_for(fingerprint: &str, next_available_at: Option<DateTime<Utc>>) -> Scan {
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
        device_fingerprint: Some(fingerprint.to_string()),
        verification_status: VerificationStatus::Approved,
        reward_unlocked: true,
        next_scan_available_at: next_available_at,
        scanned_at: now - Duration::hours(1),
        verified_at: Some(now - Duration::hours(1)),
    }
}

/// Shorthand for "device is mid-cooldown right now".
pub fn cooling_down_scan(fingerprint: &str) -> Scan {
    approved_scan_for(
        fingerprint,
        Some(Utc::now() + Duration::hours(SCAN_COOLDOWN_HOURS - 1)),
    )
}

/// Fully wired services over shared in-memory repositories.
pub struct World {
    pub scan_repo: Arc<InMemoryScanRepository>,
    pub item_repo: Arc<InMemoryItemRepository>,
    pub shop_repo: Arc<InMemoryShopRepository>,
    pub restaurant_repo: Arc<InMemoryRestaurantRepository>,
    pub eligibility: Arc<cleanplate_core::services::EligibilityService>,
    pub rewards: Arc<cleanplate_core::services::RewardService>,
}

impl World {
    pub fn new() -> Self {
        use cleanplate_core::services::{EligibilityService, RewardService};

        let scan_repo = Arc::new(InMemoryScanRepository::new());
        let item_repo = Arc::new(InMemoryItemRepository::new());
        let shop_repo = Arc::new(InMemoryShopRepository::new());
        let restaurant_repo = Arc::new(InMemoryRestaurantRepository::new());

        let eligibility = Arc::new(EligibilityService::new(
            scan_repo.clone() as Arc<dyn ScanRepository>,
        ));
        let rewards = Arc::new(RewardService::new(
            scan_repo.clone() as Arc<dyn ScanRepository>,
            item_repo.clone() as Arc<dyn ItemRepository>,
            shop_repo.clone() as Arc<dyn ShopRepository>,
            restaurant_repo.clone() as Arc<dyn RestaurantRepository>,
            eligibility.clone(),
        ));

        Self {
            scan_repo,
            item_repo,
            shop_repo,
            restaurant_repo,
            eligibility,
            rewards,
        }
    }

    /// A verification service over the same repositories, with the given
    /// verifier plugged in.
    pub fn verification(
        &self,
        verifier: Arc<dyn cleanplate_common::traits::verifier_traits::PlateVerifier>,
    ) -> cleanplate_core::services::VerificationService {
        cleanplate_core::services::VerificationService::new(
            self.scan_repo.clone() as Arc<dyn ScanRepository>,
            self.shop_repo.clone() as Arc<dyn ShopRepository>,
            self.item_repo.clone() as Arc<dyn ItemRepository>,
            self.restaurant_repo.clone() as Arc<dyn RestaurantRepository>,
            self.eligibility.clone(),
            verifier,
        )
    }
}
