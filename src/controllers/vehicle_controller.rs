use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{
    AvailabilityQuery, AvailabilityResponse, CreateVehicleRequest, FilterOptionsResponse, QuoteQuery,
    UpdateVehicleRequest,
};
use crate::models::booking::PricingUnit;
use crate::models::vehicle::{Vehicle, VehicleFilters, VehicleSearch, VehicleType};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::booking_service::{BookingService, Quote};
use crate::utils::errors::{bad_request_error, AppError};
use crate::utils::validation::parse_window;

pub struct VehicleController {
    repository: VehicleRepository,
    bookings: BookingService<BookingRepository>,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            bookings: BookingService::new(BookingRepository::new(pool)),
        }
    }

    pub async fn search(&self, filters: VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let search = VehicleSearch::try_from(filters)?;
        self.repository.search(&search).await
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self.repository.create(owner_id, request).await?;
        tracing::info!(vehicle_id = %vehicle.id, owner_id = %owner_id, "Vehicle created");

        Ok(ApiResponse::success_with_message(vehicle, "Vehicle created"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Vehicle, AppError> {
        self.repository.find_active(id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        request.validate()?;
        let vehicle = self.repository.update(id, owner_id, request).await?;

        Ok(ApiResponse::success_with_message(vehicle, "Vehicle updated"))
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id, owner_id).await?;
        tracing::info!(vehicle_id = %id, "Vehicle deleted");
        Ok(())
    }

    pub async fn quote(&self, id: Uuid, query: QuoteQuery) -> Result<Quote, AppError> {
        query.validate()?;

        let (Some(start_at), Some(end_at), Some(pricing_unit)) = (query.start_at, query.end_at, query.pricing_unit)
        else {
            return Err(bad_request_error("start_at, end_at, and pricing_unit are required."));
        };

        let (start_at, end_at) = parse_window(&start_at, &end_at)?;
        let pricing_unit: PricingUnit = pricing_unit.parse()?;

        self.bookings
            .quote(id, start_at, end_at, pricing_unit, query.delivery_fee)
            .await
    }

    pub async fn availability(&self, id: Uuid, query: AvailabilityQuery) -> Result<AvailabilityResponse, AppError> {
        let (Some(start_at), Some(end_at)) = (query.start_at, query.end_at) else {
            return Err(bad_request_error("start_at and end_at are required."));
        };

        let (start_at, end_at) = parse_window(&start_at, &end_at)?;
        let vehicle = self.repository.find_active(id).await?;
        let booked_slots = self.repository.booked_slots(vehicle.id, start_at, end_at).await?;

        Ok(AvailabilityResponse {
            vehicle_id: vehicle.id,
            booked_slots,
        })
    }

    pub async fn filter_options(&self) -> Result<FilterOptionsResponse, AppError> {
        let stats = self.repository.filter_stats().await?;
        let transmissions = self.repository.transmissions().await?;

        Ok(FilterOptionsResponse {
            vehicle_types: VehicleType::ALL.iter().map(|t| t.as_str()).collect(),
            transmissions,
            min_hourly_rate: stats.min_hourly_rate,
            max_hourly_rate: stats.max_hourly_rate,
            min_seats: stats.min_seats,
            max_seats: stats.max_seats,
        })
    }
}
