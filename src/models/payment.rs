//! Modelo de Payment

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::booking::BookingStatus;

pub const DEFAULT_PROVIDER: &str = "cashfree";

/// Estado del pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    /// Interpreta el estado reportado por el proveedor; `None` si no es conocido
    pub fn parse(value: &str) -> Option<PaymentStatus> {
        match value.trim() {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment - mapea a la tabla payments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub reference_id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub payload: sqlx::types::Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Webhook de pago ya interpretado
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    pub reference_id: Option<String>,
    pub booking_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
    pub payload: serde_json::Value,
}

/// Escritura atómica de un webhook: alta o actualización del pago y,
/// opcionalmente, transición de la reserva con compare-and-set
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    /// `None` crea un pago nuevo
    pub payment_id: Option<Uuid>,
    pub booking_id: Uuid,
    pub reference_id: Option<String>,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub payload: serde_json::Value,
    /// `(esperado, nuevo)`
    pub booking_transition: Option<(BookingStatus, BookingStatus)>,
}
