//! Disponibilidad de vehículos
//!
//! Las ventanas son intervalos semiabiertos `[start, end)`: dos reservas que
//! se tocan en un extremo no se solapan.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::booking::Booking;

/// `true` si `[a_start, a_end)` y `[b_start, b_end)` comparten algún instante
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    b_start < a_end && b_end > a_start
}

/// Comprueba si alguna reserva activa del vehículo choca con la ventana.
///
/// Se ignoran las reservas de otros vehículos y las canceladas.
pub fn has_conflict<'a, I>(vehicle_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>, bookings: I) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().any(|b| {
        b.vehicle_id == vehicle_id
            && b.status.is_active()
            && windows_overlap(start, end, b.start_at, b.end_at)
    })
}
