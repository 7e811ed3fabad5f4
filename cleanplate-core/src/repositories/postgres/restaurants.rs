// File: cleanplate-core/src/repositories/postgres/restaurants.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use cleanplate_common::error::Error;
use cleanplate_common::models::Restaurant;
use cleanplate_common::traits::repository_traits::RestaurantRepository;

pub struct PostgresRestaurantRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresRestaurantRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantRepository for PostgresRestaurantRepository {
    async fn get_restaurant_by_id(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, Error> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT restaurant_id, name, address, created_at, updated_at
            FROM restaurants
            WHERE restaurant_id = $1
            "#,
        )
            .bind(restaurant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(restaurant)
    }

    async fn get_default(&self) -> Result<Option<Restaurant>, Error> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT restaurant_id, name, address, created_at, updated_at
            FROM restaurants
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
            .fetch_optional(&self.pool)
            .await?;

        Ok(restaurant)
    }
}
