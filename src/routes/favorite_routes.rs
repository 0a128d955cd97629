use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::favorite_controller::FavoriteController;
use crate::dto::common::ApiResponse;
use crate::dto::favorite_dto::CreateFavoriteRequest;
use crate::middleware::auth_middleware;
use crate::models::favorite::Favorite;
use crate::models::user::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_favorite_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/:id", delete(remove_favorite))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Favorite>>, AppError> {
    let controller = FavoriteController::new(state.pool.clone());
    let favorites = controller.list(user.user_id).await?;
    Ok(Json(favorites))
}

async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateFavoriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Favorite>>), AppError> {
    let controller = FavoriteController::new(state.pool.clone());
    let response = controller.create(user.user_id, request.vehicle_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = FavoriteController::new(state.pool.clone());
    controller.delete(id, user.user_id).await?;
    Ok(Json(ApiResponse::message("Favorite removed")))
}
