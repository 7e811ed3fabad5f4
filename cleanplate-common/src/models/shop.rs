// File: cleanplate-common/src/models/shop.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopStatus {
    Active,
    Inactive,
}

impl ShopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShopStatus::Active => "Active",
            ShopStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for ShopStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(ShopStatus::Active),
            "Inactive" => Ok(ShopStatus::Inactive),
            other => Err(format!("unknown shop status '{}'", other)),
        }
    }
}

/// A participating shop inside a restaurant's food court.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub shop_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub address: String,
    pub status: ShopStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
