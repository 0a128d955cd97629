//! Persistencia de reservas y pagos en PostgreSQL
//!
//! Las escrituras que dependen de la disponibilidad toman primero un
//! `SELECT ... FOR UPDATE` sobre la fila del vehículo, de modo que dos
//! reservas concurrentes del mismo vehículo se serializan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingReschedule, BookingStatus, NewBooking};
use crate::models::payment::{Payment, PaymentRecord, PaymentStatus, DEFAULT_PROVIDER};
use crate::models::vehicle::Vehicle;
use crate::services::availability_service::has_conflict;
use crate::services::booking_service::BookingStore;
use crate::utils::errors::{map_unique_violation, AppError, AppResult, BookingError};

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bloquea la fila del vehículo hasta el final de la transacción
    async fn lock_vehicle(tx: &mut Transaction<'_, Postgres>, vehicle_id: Uuid) -> AppResult<()> {
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(vehicle_id)
            .fetch_optional(&mut **tx)
            .await?;

        locked
            .map(|_| ())
            .ok_or_else(|| BookingError::NotFound("Vehicle".to_string()).into())
    }

    /// Reservas activas del vehículo candidatas a solaparse con la ventana
    async fn active_bookings_near(
        tx: &mut Transaction<'_, Postgres>,
        vehicle_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1
              AND status IN ('pending', 'confirmed')
              AND start_at < $3
              AND end_at > $2
            "#,
        )
        .bind(vehicle_id)
        .bind(start_at)
        .bind(end_at)
        .fetch_all(&mut **tx)
        .await?;

        Ok(bookings)
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Historial: reservas confirmadas o canceladas
    pub async fn list_previous_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE customer_id = $1 AND status IN ('confirmed', 'cancelled')
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_for_customer(&self, booking_id: Uuid, customer_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND customer_id = $2",
        )
        .bind(booking_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.* FROM bookings b
            JOIN vehicles v ON v.id = b.vehicle_id
            WHERE v.owner_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_for_owner(&self, booking_id: Uuid, owner_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.* FROM bookings b
            JOIN vehicles v ON v.id = b.vehicle_id
            WHERE b.id = $1 AND v.owner_id = $2
            "#,
        )
        .bind(booking_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn find_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn insert_if_available(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        Self::lock_vehicle(&mut tx, booking.vehicle_id).await?;

        let existing = Self::active_bookings_near(&mut tx, booking.vehicle_id, booking.start_at, booking.end_at).await?;
        if has_conflict(booking.vehicle_id, booking.start_at, booking.end_at, &existing) {
            debug!(vehicle_id = %booking.vehicle_id, "Overlapping booking rejected");
            return Err(BookingError::OverlapConflict.into());
        }

        let inserted = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, booking_code, customer_id, vehicle_id, start_at, end_at, pickup_location,
                dropoff_location, delivery_fee, pricing_unit, total_price, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&booking.booking_code)
        .bind(booking.customer_id)
        .bind(booking.vehicle_id)
        .bind(booking.start_at)
        .bind(booking.end_at)
        .bind(&booking.pickup_location)
        .bind(&booking.dropoff_location)
        .bind(booking.delivery_fee)
        .bind(booking.pricing_unit)
        .bind(booking.total_price)
        .bind(BookingStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                AppError::Conflict("Booking code collision, please retry".to_string())
            })
        })?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn reschedule_if_available(&self, change: BookingReschedule) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let vehicle_id: Option<(Uuid,)> = sqlx::query_as("SELECT vehicle_id FROM bookings WHERE id = $1")
            .bind(change.booking_id)
            .fetch_optional(&mut *tx)
            .await?;
        let (vehicle_id,) = vehicle_id.ok_or_else(|| BookingError::NotFound("Booking".to_string()))?;

        // Mismo orden de bloqueo que en la creación: vehículo y luego reserva
        Self::lock_vehicle(&mut tx, vehicle_id).await?;

        let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(change.booking_id)
            .fetch_one(&mut *tx)
            .await?;
        if current.status != BookingStatus::Pending {
            return Err(BookingError::AlreadyTerminal(
                current.status.as_str().to_string(),
                "reschedule".to_string(),
            )
            .into());
        }

        let others: Vec<Booking> = Self::active_bookings_near(&mut tx, vehicle_id, change.start_at, change.end_at)
            .await?
            .into_iter()
            .filter(|b| b.id != change.booking_id)
            .collect();
        if has_conflict(vehicle_id, change.start_at, change.end_at, &others) {
            return Err(BookingError::OverlapConflict.into());
        }

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET start_at = $2, end_at = $3, pricing_unit = $4, delivery_fee = $5, total_price = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(change.booking_id)
        .bind(change.start_at)
        .bind(change.end_at)
        .bind(change.pricing_unit)
        .bind(change.delivery_fee)
        .bind(change.total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(booking_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn create_payment(&self, booking: &Booking) -> AppResult<Payment> {
        let id = Uuid::new_v4();
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, booking_id, provider, reference_id, status, amount, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, '{}'::jsonb, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(booking.id)
        .bind(DEFAULT_PROVIDER)
        .bind(id.to_string())
        .bind(PaymentStatus::Pending)
        .bind(booking.total_price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn find_payment_by_reference(&self, reference_id: &str) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE reference_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn record_payment(&self, record: PaymentRecord) -> AppResult<Option<(Payment, Booking)>> {
        let mut tx = self.pool.begin().await?;

        let booking = match record.booking_transition {
            Some((expected, next)) => {
                let updated = sqlx::query_as::<_, Booking>(
                    "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2 RETURNING *",
                )
                .bind(record.booking_id)
                .bind(expected)
                .bind(next)
                .fetch_optional(&mut *tx)
                .await?;

                match updated {
                    Some(booking) => booking,
                    None => {
                        tx.rollback().await?;
                        return Ok(None);
                    }
                }
            }
            None => sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
                .bind(record.booking_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| BookingError::NotFound("Booking".to_string()))?,
        };

        let payload = sqlx::types::Json(record.payload);
        let payment = match record.payment_id {
            Some(payment_id) => sqlx::query_as::<_, Payment>(
                "UPDATE payments SET status = $2, payload = $3 WHERE id = $1 RETURNING *",
            )
            .bind(payment_id)
            .bind(record.status)
            .bind(payload)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?,
            None => {
                let id = Uuid::new_v4();
                sqlx::query_as::<_, Payment>(
                    r#"
                    INSERT INTO payments (id, booking_id, provider, reference_id, status, amount, payload, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(record.booking_id)
                .bind(DEFAULT_PROVIDER)
                .bind(record.reference_id.unwrap_or_else(|| id.to_string()))
                .bind(record.status)
                .bind(record.amount)
                .bind(payload)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(Some((payment, booking)))
    }
}
