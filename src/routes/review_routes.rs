use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};

use crate::controllers::review_controller::ReviewController;
use crate::dto::common::ApiResponse;
use crate::dto::review_dto::{CreateReviewRequest, ReviewQuery};
use crate::middleware::auth_middleware;
use crate::models::review::Review;
use crate::models::user::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_review_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<Review>>, AppError> {
    let controller = ReviewController::new(state.pool.clone());
    let reviews = controller.list(query.vehicle).await?;
    Ok(Json(reviews))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), AppError> {
    let controller = ReviewController::new(state.pool.clone());
    let response = controller.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
