use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentNotification, PaymentStatus};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::parse_uuid;

// Response de pago (sin el payload del proveedor)
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub reference_id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            provider: payment.provider,
            reference_id: payment.reference_id,
            status: payment.status,
            amount: payment.amount,
            created_at: payment.created_at,
        }
    }
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Interpreta el cuerpo crudo del webhook; el cuerpo completo se conserva
/// como payload del pago
pub fn parse_payment_notification(payload: Value) -> AppResult<PaymentNotification> {
    if !payload.is_object() {
        return Err(AppError::BadRequest("Webhook body must be a JSON object".to_string()));
    }

    let booking_id = scalar_to_string(payload.get("booking_id"))
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_uuid("booking_id", &s))
        .transpose()?;

    Ok(PaymentNotification {
        reference_id: scalar_to_string(payload.get("reference_id")),
        booking_id,
        status: scalar_to_string(payload.get("status")).and_then(|s| PaymentStatus::parse(&s)),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_notification() {
        let id = Uuid::new_v4();
        let notification = parse_payment_notification(json!({
            "reference_id": "cf_001",
            "booking_id": id.to_string(),
            "status": "success",
            "extra": { "gateway": "upi" }
        }))
        .unwrap();

        assert_eq!(notification.reference_id.as_deref(), Some("cf_001"));
        assert_eq!(notification.booking_id, Some(id));
        assert_eq!(notification.status, Some(PaymentStatus::Success));
        assert_eq!(notification.payload["extra"]["gateway"], "upi");
    }

    #[test]
    fn test_unknown_status_and_numeric_reference() {
        let notification = parse_payment_notification(json!({ "reference_id": 42, "status": "refunded" })).unwrap();
        assert_eq!(notification.reference_id.as_deref(), Some("42"));
        assert!(notification.status.is_none());
        assert!(notification.booking_id.is_none());
    }

    #[test]
    fn test_invalid_bodies() {
        assert!(parse_payment_notification(json!([1, 2])).is_err());
        assert!(parse_payment_notification(json!({ "booking_id": "17" })).is_err());
    }
}
