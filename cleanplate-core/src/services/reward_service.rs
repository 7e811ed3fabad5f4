use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use cleanplate_common::models::{Item, Scan, Shop, VerificationStatus, SCAN_COOLDOWN_HOURS};
use cleanplate_common::traits::repository_traits::{
    ItemRepository, RestaurantRepository, ScanRepository, ShopRepository,
};
use crate::services::eligibility_service::EligibilityService;
use crate::Error;

/// Prefix stamped on every redemption code shown to shop staff.
const REWARD_CODE_PREFIX: &str = "BNY";

#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub restaurant_id: Uuid,
    pub shop_id: Uuid,
    pub item_id: Uuid,
    pub device_fingerprint: String,
    pub guest_name: Option<String>,
}

/// Everything the guest needs to redeem their reward at the counter. The
/// `claimed_at`/`expires_at` pair here is authoritative; client-side caches
/// are hints at best.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub scan_id: Uuid,
    pub reward_code: String,
    pub item_name: String,
    pub shop_name: String,
    pub original_price: i64,
    pub discounted_price: i64,
    pub discount_amount: i64,
    pub claimed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    pub original_price: i64,
    pub discounted_price: i64,
    pub quantity_available: i32,
    pub discount_amount: i64,
    pub discount_percentage: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopOffers {
    pub shop: ShopSummary,
    pub items: Vec<Offer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferBoard {
    pub restaurant: RestaurantSummary,
    pub shops: Vec<ShopOffers>,
    pub total_offers: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentScan {
    pub id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub shop_name: String,
    pub item_name: String,
    pub discount_applied: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetrics {
    pub total_scans: i64,
    pub total_rewards_value: i64,
    pub recent: Vec<RecentScan>,
}

/// The reward claim engine: re-checks eligibility, atomically reserves one
/// unit of inventory, writes the approved scan and mints the redemption
/// code. Also serves the offer board and the dashboard read model.
pub struct RewardService {
    scan_repo: Arc<dyn ScanRepository>,
    item_repo: Arc<dyn ItemRepository>,
    shop_repo: Arc<dyn ShopRepository>,
    restaurant_repo: Arc<dyn RestaurantRepository>,
    eligibility: Arc<EligibilityService>,
}

impl RewardService {
    pub fn new(
        scan_repo: Arc<dyn ScanRepository>,
        item_repo: Arc<dyn ItemRepository>,
        shop_repo: Arc<dyn ShopRepository>,
        restaurant_repo: Arc<dyn RestaurantRepository>,
        eligibility: Arc<EligibilityService>,
    ) -> Self {
        Self {
            scan_repo,
            item_repo,
            shop_repo,
            restaurant_repo,
            eligibility,
        }
    }

    /// Claim one discounted item for a device. Inventory reservation and the
    /// scan write either both happen or neither does.
    pub async fn claim_reward(&self, req: ClaimRequest) -> Result<ClaimReceipt, Error> {
        // 1) Validate input
        if req.device_fingerprint.trim().is_empty() {
            return Err(Error::Validation("Device identifier is required.".into()));
        }

        // 2) Re-check the cooldown as of now; a stale client-side check is
        //    not trusted
        self.eligibility
            .ensure_eligible(&req.device_fingerprint)
            .await?;

        // 3) Resolve the referenced entities
        let restaurant = self
            .restaurant_repo
            .get_restaurant_by_id(req.restaurant_id)
            .await?
            .ok_or_else(|| Error::NotFound("Restaurant not found.".into()))?;
        let shop = self
            .shop_repo
            .get_shop_by_id(req.shop_id)
            .await?
            .ok_or_else(|| Error::NotFound("Shop not found.".into()))?;
        let item = self
            .item_repo
            .get_item_by_id(req.item_id)
            .await?
            .ok_or_else(|| Error::NotFound("Item not found.".into()))?;
        if item.shop_id != shop.shop_id {
            return Err(Error::Validation(
                "Item does not belong to the selected shop.".into(),
            ));
        }

        // 4) Cheap pre-check so obviously dead offers fail without mutating
        //    anything
        if !item.is_active || !item.discount_active || item.quantity_available <= 0 {
            return Err(Error::Conflict("This item is no longer available.".into()));
        }

        // 5) Atomically take one unit; the condition is re-evaluated at
        //    decrement time, so concurrent claims on the last unit get
        //    exactly one winner
        let reserved = self
            .item_repo
            .reserve_unit(req.item_id)
            .await?
            .ok_or_else(|| Error::Conflict("This item is no longer available.".into()))?;

        // 6) Write the approved scan with prices snapshotted from the
        //    reserved row
        let now = Utc::now();
        let scan = Scan {
            scan_id: Uuid::new_v4(),
            restaurant_id: Some(restaurant.restaurant_id),
            shop_id: Some(shop.shop_id),
            item_id: Some(reserved.item_id),
            original_price: reserved.original_price,
            discounted_price: reserved.discounted_price,
            discount_amount: reserved.discount_amount(),
            guest_name: Some(req.guest_name.unwrap_or_else(|| "Guest".to_string())),
            plate_image_url: None,
            device_fingerprint: Some(req.device_fingerprint.clone()),
            verification_status: VerificationStatus::Approved,
            reward_unlocked: true,
            next_scan_available_at: Some(now + Duration::hours(SCAN_COOLDOWN_HOURS)),
            scanned_at: now,
            verified_at: Some(now),
        };

        if let Err(e) = self.scan_repo.create_scan(&scan).await {
            // Compensating rollback: give the reserved unit back rather than
            // leak it.
            if let Err(release_err) = self.item_repo.release_unit(req.item_id).await {
                error!(
                    "failed to release unit of item {} after scan write error: {:?}",
                    req.item_id, release_err
                );
            }
            return Err(e);
        }

        let reward_code = reward_code(scan.scan_id);
        info!(
            "reward claimed: scan={} item={} code={}",
            scan.scan_id, reserved.item_id, reward_code
        );

        Ok(ClaimReceipt {
            scan_id: scan.scan_id,
            reward_code,
            item_name: reserved.name,
            shop_name: shop.name,
            original_price: scan.original_price,
            discounted_price: scan.discounted_price,
            discount_amount: scan.discount_amount,
            claimed_at: now,
            expires_at: now + Duration::hours(SCAN_COOLDOWN_HOURS),
        })
    }

    /// The offer board: active shops of a restaurant with their live
    /// discounted items, grouped per shop. Shops with nothing on offer are
    /// dropped.
    pub async fn list_offers(&self, restaurant_id: Option<Uuid>) -> Result<OfferBoard, Error> {
        let restaurant = match restaurant_id {
            Some(id) => self.restaurant_repo.get_restaurant_by_id(id).await?,
            None => self.restaurant_repo.get_default().await?,
        }
        .ok_or_else(|| Error::NotFound("Restaurant not found.".into()))?;

        let shops = self
            .shop_repo
            .list_active_for_restaurant(restaurant.restaurant_id)
            .await?;
        let shop_ids: Vec<Uuid> = shops.iter().map(|s| s.shop_id).collect();
        let items = self.item_repo.list_live_discounts_for_shops(&shop_ids).await?;
        let total_offers = items.len();

        let mut by_shop: HashMap<Uuid, Vec<Offer>> = HashMap::new();
        for item in items {
            by_shop
                .entry(item.shop_id)
                .or_default()
                .push(to_offer(&item));
        }

        let shops = shops
            .into_iter()
            .filter_map(|shop| {
                by_shop.remove(&shop.shop_id).map(|items| ShopOffers {
                    shop: shop_summary(&shop),
                    items,
                })
            })
            .collect();

        Ok(OfferBoard {
            restaurant: RestaurantSummary {
                id: restaurant.restaurant_id,
                name: restaurant.name,
                address: restaurant.address,
            },
            shops,
            total_offers,
        })
    }

    /// Dashboard read model over the immutable scan trail.
    pub async fn scan_metrics(&self) -> Result<ScanMetrics, Error> {
        let totals = self.scan_repo.totals().await?;
        let recent = self
            .scan_repo
            .list_recent(10)
            .await?
            .into_iter()
            .map(|s| RecentScan {
                id: s.scan_id,
                scanned_at: s.scanned_at,
                shop_name: s.shop_name.unwrap_or_else(|| "Unknown".to_string()),
                item_name: s.item_name.unwrap_or_else(|| "Unknown".to_string()),
                discount_applied: s.discount_amount,
            })
            .collect();

        Ok(ScanMetrics {
            total_scans: totals.total_scans,
            total_rewards_value: totals.total_discount,
            recent,
        })
    }
}

/// Redemption code shown at the counter: fixed prefix plus the tail of the
/// scan id, uppercased. It carries no data; redeeming means looking the
/// scan back up.
fn reward_code(scan_id: Uuid) -> String {
    let simple = scan_id.simple().to_string();
    let tail = &simple[simple.len() - 5..];
    format!("{}-{}", REWARD_CODE_PREFIX, tail.to_uppercase())
}

fn shop_summary(shop: &Shop) -> ShopSummary {
    ShopSummary {
        id: shop.shop_id,
        name: shop.name.clone(),
        address: shop.address.clone(),
    }
}

fn to_offer(item: &Item) -> Offer {
    let discount_amount = item.discount_amount();
    let discount_percentage = if item.original_price > 0 {
        ((discount_amount as f64 / item.original_price as f64) * 100.0).round() as i64
    } else {
        0
    };
    Offer {
        id: item.item_id,
        name: item.name.clone(),
        original_price: item.original_price,
        discounted_price: item.discounted_price,
        quantity_available: item.quantity_available,
        discount_amount,
        discount_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_code_uses_prefix_and_uppercased_id_tail() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(reward_code(id), "BNY-FE0C8");
    }

    #[test]
    fn discount_percentage_rounds_and_survives_zero_price() {
        let now = Utc::now();
        let mut item = Item {
            item_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            name: "Bao".into(),
            original_price: 1000,
            discounted_price: 666,
            quantity_available: 3,
            discount_active: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(to_offer(&item).discount_percentage, 33);

        item.original_price = 0;
        item.discounted_price = 0;
        assert_eq!(to_offer(&item).discount_percentage, 0);
    }
}
