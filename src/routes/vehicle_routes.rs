use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{
    AvailabilityQuery, AvailabilityResponse, CreateVehicleRequest, FilterOptionsResponse, QuoteQuery,
    UpdateVehicleRequest,
};
use crate::middleware::{auth_middleware, require_role};
use crate::models::user::{AuthenticatedUser, UserRole};
use crate::models::vehicle::{Vehicle, VehicleFilters};
use crate::services::booking_service::Quote;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Lectura pública; escritura solo para el propietario autenticado
pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_vehicles))
        .route("/:id", get(get_vehicle))
        .route("/:id/quote", get(quote_vehicle))
        .route("/:id/availability", get(vehicle_availability));

    let owner = Router::new()
        .route("/", post(create_vehicle))
        .route("/:id", put(update_vehicle).delete(delete_vehicle))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(owner)
}

pub fn create_filter_router() -> Router<AppState> {
    Router::new().route("/", get(filter_options))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let vehicles = controller.search(filters).await?;
    Ok(Json(vehicles))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    require_role(&user, UserRole::Owner)?;
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let vehicle = controller.get_by_id(id).await?;
    Ok(Json(vehicle))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    require_role(&user, UserRole::Owner)?;
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.update(id, user.user_id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    require_role(&user, UserRole::Owner)?;
    let controller = VehicleController::new(state.pool.clone());
    controller.delete(id, user.user_id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted")))
}

async fn quote_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let quote = controller.quote(id, query).await?;
    Ok(Json(quote))
}

async fn vehicle_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.availability(id, query).await?;
    Ok(Json(response))
}

async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptionsResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let options = controller.filter_options().await?;
    Ok(Json(options))
}
