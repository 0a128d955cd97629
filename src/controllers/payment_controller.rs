use serde_json::Value;
use sqlx::PgPool;

use crate::dto::common::ApiResponse;
use crate::dto::payment_dto::{parse_payment_notification, PaymentResponse};
use crate::repositories::booking_repository::BookingRepository;
use crate::services::booking_service::BookingService;
use crate::utils::errors::AppError;

pub struct PaymentController {
    service: BookingService<BookingRepository>,
}

impl PaymentController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: BookingService::new(BookingRepository::new(pool)),
        }
    }

    pub async fn webhook(&self, body: Value) -> Result<ApiResponse<PaymentResponse>, AppError> {
        let notification = parse_payment_notification(body)?;
        let (payment, _booking) = self.service.handle_payment_webhook(notification).await?;

        Ok(ApiResponse::success_with_message(
            PaymentResponse::from(payment),
            "Webhook processed.",
        ))
    }
}
