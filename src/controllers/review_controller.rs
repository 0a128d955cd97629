use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::review_dto::CreateReviewRequest;
use crate::models::review::Review;
use crate::repositories::review_repository::ReviewRepository;
use crate::utils::errors::AppError;

pub struct ReviewController {
    repository: ReviewRepository,
}

impl ReviewController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ReviewRepository::new(pool),
        }
    }

    pub async fn list(&self, vehicle_id: Option<Uuid>) -> Result<Vec<Review>, AppError> {
        self.repository.list(vehicle_id).await
    }

    pub async fn create(&self, reviewer_id: Uuid, request: CreateReviewRequest) -> Result<ApiResponse<Review>, AppError> {
        request.validate()?;
        let review = self.repository.create(reviewer_id, request).await?;
        Ok(ApiResponse::success_with_message(review, "Review created"))
    }
}
