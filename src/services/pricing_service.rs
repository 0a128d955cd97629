//! Cálculo de precios de alquiler
//!
//! Funciones puras sin acceso a base de datos. Toda la aritmética es
//! decimal exacta; el redondeo (2 decimales, mitad hacia arriba) se aplica
//! en cada paso intermedio y no solo al final.

use chrono::{DateTime, TimeZone};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::models::booking::PricingUnit;
use crate::models::vehicle::RateCard;
use crate::utils::errors::BookingError;
use crate::utils::validation::{MAX_MONEY_AMOUNT, MAX_TOTAL_AMOUNT};

const SECONDS_PER_HOUR: i64 = 3_600;
const HOURS_PER_DAY: i64 = 24;
const HOURS_PER_WEEK: i64 = 168;

/// Redondea a 2 decimales con ROUND_HALF_UP y fija la escala en 2.
///
/// ```
/// use rust_decimal::Decimal;
/// use vehicle_rental::services::pricing_service::round_money;
///
/// assert_eq!(round_money(Decimal::new(1005, 3)).to_string(), "1.01");
/// assert_eq!(round_money(Decimal::from(100)).to_string(), "100.00");
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Duración de la ventana en horas, con resolución de microsegundos
pub fn duration_hours<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Decimal {
    let delta = end.clone().signed_duration_since(start.clone());
    let seconds = match delta.num_microseconds() {
        Some(micros) => Decimal::new(micros, 6),
        None => Decimal::from(delta.num_seconds()),
    };
    seconds / Decimal::from(SECONDS_PER_HOUR)
}

/// Precio total de un alquiler.
///
/// * hourly: `round(horas * tarifa_hora)`
/// * daily: `round(round(horas / 24) * tarifa_dia)`
/// * weekly: `round(round(horas / 168) * tarifa_semana)`
///
/// y finalmente `round(base + delivery_fee)`. El delivery fee debe caber en
/// `NUMERIC(10,2)` y el total en `NUMERIC(12,2)`; fuera de rango se devuelve
/// `AmountOutOfRange` en lugar de desbordar.
pub fn compute_total<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    pricing_unit: PricingUnit,
    rates: &RateCard,
    delivery_fee: Decimal,
) -> Result<Decimal, BookingError> {
    if start >= end {
        return Err(BookingError::InvalidWindow);
    }
    if (delivery_fee.is_sign_negative() && !delivery_fee.is_zero()) || delivery_fee > MAX_MONEY_AMOUNT {
        return Err(BookingError::AmountOutOfRange("delivery_fee"));
    }

    let hours = duration_hours(start, end);
    let overflow = || BookingError::AmountOutOfRange("total_price");

    let base = match pricing_unit {
        PricingUnit::Hourly => hours.checked_mul(rates.hourly_rate).ok_or_else(overflow)?,
        PricingUnit::Daily => {
            let days = round_money(hours / Decimal::from(HOURS_PER_DAY));
            days.checked_mul(rates.daily_rate).ok_or_else(overflow)?
        }
        PricingUnit::Weekly => {
            let weeks = round_money(hours / Decimal::from(HOURS_PER_WEEK));
            weeks.checked_mul(rates.weekly_rate).ok_or_else(overflow)?
        }
    };

    let total = round_money(round_money(base).checked_add(delivery_fee).ok_or_else(overflow)?);
    if total > MAX_TOTAL_AMOUNT {
        return Err(overflow());
    }
    Ok(total)
}
