use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{CreateBookingRequest, RescheduleBookingRequest};
use crate::dto::common::ApiResponse;
use crate::dto::payment_dto::PaymentResponse;
use crate::models::booking::Booking;
use crate::repositories::booking_repository::BookingRepository;
use crate::services::booking_service::BookingService;
use crate::utils::errors::{not_found_error, AppError};

pub struct BookingController {
    repository: BookingRepository,
    service: BookingService<BookingRepository>,
}

impl BookingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool.clone()),
            service: BookingService::new(BookingRepository::new(pool)),
        }
    }

    // ==================== Cliente ====================

    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_for_customer(customer_id).await
    }

    pub async fn previous_for_customer(&self, customer_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_previous_for_customer(customer_id).await
    }

    pub async fn get_for_customer(&self, id: Uuid, customer_id: Uuid) -> Result<Booking, AppError> {
        self.repository
            .find_for_customer(id, customer_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))
    }

    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        request.validate()?;
        let booking = self
            .service
            .create_booking(customer_id, request.into_booking_request()?)
            .await?;

        Ok(ApiResponse::success_with_message(booking, "Booking created"))
    }

    pub async fn reschedule(
        &self,
        id: Uuid,
        customer_id: Uuid,
        request: RescheduleBookingRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        request.validate()?;
        let booking = self
            .service
            .reschedule(customer_id, id, request.into_reschedule_request()?)
            .await?;

        Ok(ApiResponse::success_with_message(booking, "Booking updated"))
    }

    pub async fn cancel(&self, id: Uuid, customer_id: Uuid) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self.service.cancel(customer_id, id).await?;
        Ok(ApiResponse::success_with_message(booking, "Booking cancelled."))
    }

    pub async fn checkout(&self, id: Uuid, customer_id: Uuid) -> Result<ApiResponse<PaymentResponse>, AppError> {
        let payment = self.service.checkout(customer_id, id).await?;
        Ok(ApiResponse::success_with_message(
            PaymentResponse::from(payment),
            "Payment created, complete it with the payment provider",
        ))
    }

    // ==================== Propietario ====================

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_for_owner(owner_id).await
    }

    pub async fn get_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Booking, AppError> {
        self.repository
            .find_for_owner(id, owner_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))
    }

    pub async fn approve(&self, id: Uuid, owner_id: Uuid) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self.service.approve(owner_id, id).await?;
        Ok(ApiResponse::success_with_message(booking, "Booking confirmed."))
    }

    pub async fn reject(&self, id: Uuid, owner_id: Uuid) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self.service.reject(owner_id, id).await?;
        Ok(ApiResponse::success_with_message(booking, "Booking rejected."))
    }
}
