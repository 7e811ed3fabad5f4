// File: cleanplate-core/src/repositories/postgres/shops.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cleanplate_common::error::Error;
use cleanplate_common::models::Shop;
use cleanplate_common::traits::repository_traits::ShopRepository;

pub struct PostgresShopRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresShopRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn shop_from_row(r: &PgRow) -> Result<Shop, Error> {
        let status: String = r.try_get("status")?;
        Ok(Shop {
            shop_id: r.try_get("shop_id")?,
            restaurant_id: r.try_get("restaurant_id")?,
            name: r.try_get("name")?,
            address: r.try_get("address")?,
            status: status.parse().map_err(Error::Parse)?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ShopRepository for PostgresShopRepository {
    async fn get_shop_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT shop_id, restaurant_id, name, address, status, created_at, updated_at
            FROM shops
            WHERE shop_id = $1
            "#,
        )
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| Self::shop_from_row(&r)).transpose()
    }

    async fn list_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Shop>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT shop_id, restaurant_id, name, address, status, created_at, updated_at
            FROM shops
            WHERE restaurant_id = $1
              AND status = 'Active'
            ORDER BY name ASC
            "#,
        )
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(Self::shop_from_row(&r)?);
        }
        Ok(list)
    }
}
