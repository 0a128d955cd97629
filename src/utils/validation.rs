//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos. Los timestamps de entrada deben llevar zona
//! horaria: un valor sin offset se rechaza con `NaiveTimestamp` en lugar de
//! asumir UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::ValidationError;

use crate::utils::errors::{AppError, AppResult, BookingError};

/// Mayor importe que cabe en `NUMERIC(10,2)` (tarifas y delivery fee)
pub const MAX_MONEY_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Mayor importe que cabe en `NUMERIC(12,2)` (totales y pagos)
pub const MAX_TOTAL_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Interpreta un timestamp ISO-8601 con offset y lo normaliza a UTC
pub fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    let raw = value.trim();
    // "2024-01-01 10:00:00+00:00" también es ISO-8601 válido
    let normalized = if raw.len() > 10 && raw.as_bytes()[10] == b' ' {
        format!("{}T{}", &raw[..10], &raw[11..])
    } else {
        raw.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    let is_naive = NAIVE_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).is_ok())
        || NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").is_ok();

    if is_naive {
        return Err(BookingError::NaiveTimestamp(raw.to_string()).into());
    }

    Err(AppError::BadRequest(format!(
        "Field '{}' is not a valid ISO-8601 datetime: '{}'",
        field, raw
    )))
}

/// Interpreta ambos extremos de una ventana y exige `start < end`
pub fn parse_window(start: &str, end: &str) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start_at = parse_timestamp("start_at", start)?;
    let end_at = parse_timestamp("end_at", end)?;
    if start_at >= end_at {
        return Err(BookingError::InvalidWindow.into());
    }
    Ok((start_at, end_at))
}

/// Validar y convertir string a UUID
pub fn parse_uuid(field: &str, value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::BadRequest(format!("Field '{}' must be a valid UUID", field)))
}

/// Validar que un importe no sea negativo y quepa en `NUMERIC(10,2)`
pub fn validate_money_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    if *value > MAX_MONEY_AMOUNT {
        let mut error = ValidationError::new("max_amount");
        error.add_param("max".into(), &MAX_MONEY_AMOUNT.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Interpreta flags de query string como `1`, `true` o `yes`
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

/// Separa una lista CSV descartando entradas vacías
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
