use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::review_dto::CreateReviewRequest;
use crate::models::review::Review;
use crate::utils::errors::{not_found_error, AppError};

pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, reviewer_id: Uuid, request: CreateReviewRequest) -> Result<Review, AppError> {
        let vehicle_exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1)")
            .bind(request.vehicle_id)
            .fetch_one(&self.pool)
            .await?;
        if !vehicle_exists.0 {
            return Err(not_found_error("Vehicle", &request.vehicle_id.to_string()));
        }

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, vehicle_id, reviewer_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.vehicle_id)
        .bind(reviewer_id)
        .bind(request.rating)
        .bind(request.comment)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    pub async fn list(&self, vehicle_id: Option<Uuid>) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
