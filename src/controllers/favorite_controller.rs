use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::ApiResponse;
use crate::models::favorite::Favorite;
use crate::repositories::favorite_repository::FavoriteRepository;
use crate::utils::errors::AppError;

pub struct FavoriteController {
    repository: FavoriteRepository,
}

impl FavoriteController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: FavoriteRepository::new(pool),
        }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Favorite>, AppError> {
        self.repository.list_for_user(user_id).await
    }

    pub async fn create(&self, user_id: Uuid, vehicle_id: Uuid) -> Result<ApiResponse<Favorite>, AppError> {
        let favorite = self.repository.create(user_id, vehicle_id).await?;
        Ok(ApiResponse::success_with_message(favorite, "Favorite added"))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id, user_id).await
    }
}
