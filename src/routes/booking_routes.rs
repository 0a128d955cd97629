use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{CreateBookingRequest, RescheduleBookingRequest};
use crate::dto::common::ApiResponse;
use crate::dto::payment_dto::PaymentResponse;
use crate::middleware::{auth_middleware, customer_only_middleware};
use crate::models::booking::Booking;
use crate::models::user::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/previous", get(previous_bookings))
        .route("/:id", get(get_booking).put(reschedule_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/checkout", post(checkout_booking))
        .route_layer(middleware::from_fn(customer_only_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let bookings = controller.list_for_customer(user.user_id).await?;
    Ok(Json(bookings))
}

async fn previous_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let bookings = controller.previous_for_customer(user.user_id).await?;
    Ok(Json(bookings))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let booking = controller.get_for_customer(id, user.user_id).await?;
    Ok(Json(booking))
}

async fn reschedule_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.reschedule(id, user.user_id, request).await?;
    Ok(Json(response))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.cancel(id, user.user_id).await?;
    Ok(Json(response))
}

async fn checkout_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.checkout(id, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
