use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::common::ApiResponse;
use crate::middleware::{auth_middleware, owner_only_middleware};
use crate::models::booking::Booking;
use crate::models::user::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_owner_booking_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_owner_bookings))
        .route("/:id", get(get_owner_booking))
        .route("/:id/approve", post(approve_booking))
        .route("/:id/reject", post(reject_booking))
        .route_layer(middleware::from_fn(owner_only_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_owner_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let bookings = controller.list_for_owner(user.user_id).await?;
    Ok(Json(bookings))
}

async fn get_owner_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.get_for_owner(id, user.user_id).await?;
    Ok(Json(booking))
}

async fn approve_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.approve(id, user.user_id).await?;
    Ok(Json(response))
}

async fn reject_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.reject(id, user.user_id).await?;
    Ok(Json(response))
}
