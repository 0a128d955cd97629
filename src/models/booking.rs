//! Modelo de Booking
//!
//! Contiene la reserva tal como se persiste, la unidad de precio y la
//! máquina de estados de la reserva. Las transiciones son funciones puras
//! que devuelven el nuevo estado o un error; nunca mutan la reserva.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::BookingError;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Eventos que pueden mover una reserva de estado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    /// El propietario aprueba la reserva
    Approve,
    /// El proveedor de pagos confirma el cobro
    PaymentSucceeded,
    /// El cliente cancela
    Cancel,
    /// El propietario rechaza
    Reject,
}

impl BookingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEvent::Approve => "approve",
            BookingEvent::PaymentSucceeded => "payment_succeeded",
            BookingEvent::Cancel => "cancel",
            BookingEvent::Reject => "reject",
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Las reservas activas bloquean el vehículo para su ventana
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Aplica un evento y devuelve el estado resultante.
    ///
    /// | estado     | evento                         | resultado   |
    /// |------------|--------------------------------|-------------|
    /// | pending    | approve / payment_succeeded    | confirmed   |
    /// | pending    | cancel / reject                | cancelled   |
    /// | confirmed  | cancel                         | cancelled   |
    ///
    /// Cualquier otra combinación falla con `AlreadyTerminal`.
    pub fn apply(self, event: BookingEvent) -> Result<BookingStatus, BookingError> {
        use BookingEvent::*;
        use BookingStatus::*;

        match (self, event) {
            (Pending, Approve) | (Pending, PaymentSucceeded) => Ok(Confirmed),
            (Pending, Cancel) | (Pending, Reject) => Ok(Cancelled),
            (Confirmed, Cancel) => Ok(Cancelled),
            (status, event) => Err(BookingError::AlreadyTerminal(
                status.as_str().to_string(),
                event.as_str().to_string(),
            )),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unidad de precio - mapea al ENUM pricing_unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "pricing_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PricingUnit {
    Hourly,
    Daily,
    Weekly,
}

impl PricingUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingUnit::Hourly => "hourly",
            PricingUnit::Daily => "daily",
            PricingUnit::Weekly => "weekly",
        }
    }
}

impl FromStr for PricingUnit {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "hourly" => Ok(PricingUnit::Hourly),
            "daily" => Ok(PricingUnit::Daily),
            "weekly" => Ok(PricingUnit::Weekly),
            other => Err(BookingError::UnknownPricingUnit(other.to_string())),
        }
    }
}

impl fmt::Display for PricingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking principal - mapea a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub delivery_fee: Decimal,
    pub pricing_unit: PricingUnit,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Reserva lista para insertar; el código y el total ya están calculados
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_code: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub delivery_fee: Decimal,
    pub pricing_unit: PricingUnit,
    pub total_price: Decimal,
}

/// Cambio de ventana de una reserva pendiente
#[derive(Debug, Clone)]
pub struct BookingReschedule {
    pub booking_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pricing_unit: PricingUnit,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
}
