use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::PricingUnit;
use crate::services::booking_service::{BookingRequest, RescheduleRequest};
use crate::utils::errors::AppResult;
use crate::utils::validation::{parse_window, validate_money_amount};

// Request para crear una reserva; los timestamps llegan como texto ISO-8601
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Uuid,
    pub start_at: String,
    pub end_at: String,
    pub pricing_unit: String,
    #[validate(custom = "validate_money_amount")]
    pub delivery_fee: Option<Decimal>,
    #[validate(length(max = 200))]
    pub pickup_location: Option<String>,
    #[validate(length(max = 200))]
    pub dropoff_location: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_booking_request(self) -> AppResult<BookingRequest> {
        let (start_at, end_at) = parse_window(&self.start_at, &self.end_at)?;
        let pricing_unit: PricingUnit = self.pricing_unit.parse()?;

        Ok(BookingRequest {
            vehicle_id: self.vehicle_id,
            start_at,
            end_at,
            pricing_unit,
            delivery_fee: self.delivery_fee,
            pickup_location: self.pickup_location,
            dropoff_location: self.dropoff_location,
        })
    }
}

// Request para mover una reserva pendiente
#[derive(Debug, Deserialize, Validate)]
pub struct RescheduleBookingRequest {
    pub start_at: String,
    pub end_at: String,
    pub pricing_unit: Option<String>,
    #[validate(custom = "validate_money_amount")]
    pub delivery_fee: Option<Decimal>,
}

impl RescheduleBookingRequest {
    pub fn into_reschedule_request(self) -> AppResult<RescheduleRequest> {
        let (start_at, end_at) = parse_window(&self.start_at, &self.end_at)?;
        let pricing_unit = self
            .pricing_unit
            .as_deref()
            .map(str::parse::<PricingUnit>)
            .transpose()?;

        Ok(RescheduleRequest {
            start_at,
            end_at,
            pricing_unit,
            delivery_fee: self.delivery_fee,
        })
    }
}
