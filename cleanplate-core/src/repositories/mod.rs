// src/repositories/mod.rs

pub use cleanplate_common::traits::repository_traits::{
    ItemRepository,
    RestaurantRepository,
    ScanRepository,
    ShopRepository,
};

pub use postgres::items::PostgresItemRepository;
pub use postgres::restaurants::PostgresRestaurantRepository;
pub use postgres::scans::PostgresScanRepository;
pub use postgres::shops::PostgresShopRepository;

pub mod postgres;
