// File: cleanplate-core/src/repositories/postgres/items.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use cleanplate_common::error::Error;
use cleanplate_common::models::Item;
use cleanplate_common::traits::repository_traits::ItemRepository;

pub struct PostgresItemRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresItemRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn get_item_by_id(&self, item_id: Uuid) -> Result<Option<Item>, Error> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                item_id,
                shop_id,
                name,
                original_price,
                discounted_price,
                quantity_available,
                discount_active,
                is_active,
                created_at,
                updated_at
            FROM items
            WHERE item_id = $1
            "#,
        )
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn list_live_discounts_for_shops(&self, shop_ids: &[Uuid]) -> Result<Vec<Item>, Error> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                item_id,
                shop_id,
                name,
                original_price,
                discounted_price,
                quantity_available,
                discount_active,
                is_active,
                created_at,
                updated_at
            FROM items
            WHERE shop_id = ANY($1)
              AND is_active
              AND discount_active
              AND quantity_available > 0
            ORDER BY name ASC
            "#,
        )
            .bind(shop_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn reserve_unit(&self, item_id: Uuid) -> Result<Option<Item>, Error> {
        // Single conditional decrement. The WHERE clause is evaluated at
        // decrement time, so N racing claims against the last unit resolve
        // to exactly one winner regardless of how many server instances run.
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET quantity_available = quantity_available - 1,
                updated_at = now()
            WHERE item_id = $1
              AND is_active
              AND discount_active
              AND quantity_available > 0
            RETURNING
                item_id,
                shop_id,
                name,
                original_price,
                discounted_price,
                quantity_available,
                discount_active,
                is_active,
                created_at,
                updated_at
            "#,
        )
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn release_unit(&self, item_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE items
            SET quantity_available = quantity_available + 1,
                updated_at = now()
            WHERE item_id = $1
            "#,
        )
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
