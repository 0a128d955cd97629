use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::favorite::Favorite;
use crate::utils::errors::{conflict_error, map_unique_violation, not_found_error, AppError};

pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, vehicle_id: Uuid) -> Result<Favorite, AppError> {
        let vehicle_exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1)")
            .bind(vehicle_id)
            .fetch_one(&self.pool)
            .await?;
        if !vehicle_exists.0 {
            return Err(not_found_error("Vehicle", &vehicle_id.to_string()));
        }

        sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (id, user_id, vehicle_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(vehicle_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || conflict_error("Favorite", "vehicle", &vehicle_id.to_string()))
        })
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Favorite>, AppError> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Favorite", &id.to_string()));
        }
        Ok(())
    }
}
