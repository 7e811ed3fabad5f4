// File: cleanplate-common/src/models/item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shop's menu item. Prices are integer cents.
///
/// `quantity_available` is the one piece of shared mutable state in the
/// system; it is only ever changed through the item repository's conditional
/// reserve/release operations.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub item_id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub original_price: i64,
    pub discounted_price: i64,
    pub quantity_available: i32,
    pub discount_active: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn discount_amount(&self) -> i64 {
        self.original_price - self.discounted_price
    }
}
