use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{BookedSlot, VehicleType};
use crate::utils::validation::{validate_money_amount, validate_not_blank};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub city: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub location: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub pickup_location: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub make: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(range(min = 1, max = 60))]
    pub seats: i32,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub transmission: String,
    #[validate(custom = "validate_money_amount")]
    pub hourly_rate: Decimal,
    #[validate(custom = "validate_money_amount")]
    pub daily_rate: Decimal,
    #[validate(custom = "validate_money_amount")]
    pub weekly_rate: Decimal,
    #[validate(custom = "validate_money_amount")]
    pub delivery_fee: Option<Decimal>,
    pub is_active: Option<bool>,
}

// Request para actualizar un vehículo; los campos ausentes no cambian
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub pickup_location: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    #[validate(length(max = 100))]
    pub make: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(range(min = 1, max = 60))]
    pub seats: Option<i32>,
    #[validate(length(max = 30))]
    pub transmission: Option<String>,
    #[validate(custom = "validate_money_amount")]
    pub hourly_rate: Option<Decimal>,
    #[validate(custom = "validate_money_amount")]
    pub daily_rate: Option<Decimal>,
    #[validate(custom = "validate_money_amount")]
    pub weekly_rate: Option<Decimal>,
    #[validate(custom = "validate_money_amount")]
    pub delivery_fee: Option<Decimal>,
    pub is_active: Option<bool>,
}

// Query de /vehicles/:id/quote
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QuoteQuery {
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub pricing_unit: Option<String>,
    #[validate(custom = "validate_money_amount")]
    pub delivery_fee: Option<Decimal>,
}

// Query de /vehicles/:id/availability
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub start_at: Option<String>,
    pub end_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub vehicle_id: Uuid,
    pub booked_slots: Vec<BookedSlot>,
}

// Opciones para los filtros del frontend
#[derive(Debug, Serialize)]
pub struct FilterOptionsResponse {
    pub vehicle_types: Vec<&'static str>,
    pub transmissions: Vec<String>,
    pub min_hourly_rate: Option<Decimal>,
    pub max_hourly_rate: Option<Decimal>,
    pub min_seats: Option<i32>,
    pub max_seats: Option<i32>,
}
