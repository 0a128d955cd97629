//! Servicio de reservas
//!
//! Orquesta precio, disponibilidad, código de reserva y máquina de estados.
//! La persistencia queda detrás de `BookingStore`: la implementación
//! PostgreSQL vive en `repositories::booking_repository` y los tests usan
//! un store en memoria.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingEvent, BookingReschedule, BookingStatus, NewBooking, PricingUnit,
};
use crate::models::payment::{Payment, PaymentNotification, PaymentRecord, PaymentStatus};
use crate::models::vehicle::Vehicle;
use crate::services::pricing_service::{compute_total, duration_hours, round_money};
use crate::utils::booking_code::generate_id;
use crate::utils::errors::{bad_request_error, AppError, AppResult, BookingError};

/// Persistencia que necesita el motor de reservas.
///
/// `insert_if_available` y `reschedule_if_available` deben comprobar el
/// solape e insertar/actualizar de forma atómica respecto a otras escrituras
/// sobre el mismo vehículo. Las transiciones de estado son compare-and-set:
/// devuelven `Ok(None)` si el estado ya no es el esperado.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>>;

    async fn insert_if_available(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn reschedule_if_available(&self, change: BookingReschedule) -> AppResult<Booking>;

    async fn update_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> AppResult<Option<Booking>>;

    async fn create_payment(&self, booking: &Booking) -> AppResult<Payment>;

    async fn find_payment_by_reference(&self, reference_id: &str) -> AppResult<Option<Payment>>;

    async fn record_payment(&self, record: PaymentRecord) -> AppResult<Option<(Payment, Booking)>>;
}

/// Datos ya validados para crear una reserva
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub vehicle_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pricing_unit: PricingUnit,
    pub delivery_fee: Option<Decimal>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

/// Nueva ventana para una reserva pendiente
#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pricing_unit: Option<PricingUnit>,
    pub delivery_fee: Option<Decimal>,
}

/// Presupuesto sin reservar
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub vehicle_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pricing_unit: PricingUnit,
    pub hours: Decimal,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
}

pub struct BookingService<S: BookingStore> {
    store: S,
}

impl<S: BookingStore> BookingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn load_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.store
            .find_vehicle(vehicle_id)
            .await?
            .filter(|v| v.is_active)
            .ok_or_else(|| BookingError::NotFound("Vehicle".to_string()).into())
    }

    async fn load_booking(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking".to_string()).into())
    }

    /// Reserva del cliente; las de otros clientes se tratan como inexistentes
    async fn load_customer_booking(&self, customer_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if booking.customer_id != customer_id {
            return Err(BookingError::NotFound("Booking".to_string()).into());
        }
        Ok(booking)
    }

    /// Reserva sobre un vehículo del propietario
    async fn load_owner_booking(&self, owner_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        let owns_vehicle = self
            .store
            .find_vehicle(booking.vehicle_id)
            .await?
            .map(|v| v.owner_id == owner_id)
            .unwrap_or(false);
        if !owns_vehicle {
            return Err(BookingError::NotFound("Booking".to_string()).into());
        }
        Ok(booking)
    }

    /// Calcula el precio de una ventana sin crear la reserva
    pub async fn quote(
        &self,
        vehicle_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        pricing_unit: PricingUnit,
        delivery_fee: Option<Decimal>,
    ) -> AppResult<Quote> {
        let vehicle = self.load_vehicle(vehicle_id).await?;
        let delivery_fee = delivery_fee.unwrap_or(vehicle.delivery_fee);
        let total_price = compute_total(&start_at, &end_at, pricing_unit, &vehicle.rate_card(), delivery_fee)?;

        Ok(Quote {
            vehicle_id,
            start_at,
            end_at,
            pricing_unit,
            hours: round_money(duration_hours(&start_at, &end_at)),
            delivery_fee: round_money(delivery_fee),
            total_price,
        })
    }

    /// Crea una reserva `pending` si el vehículo está libre en la ventana
    pub async fn create_booking(&self, customer_id: Uuid, request: BookingRequest) -> AppResult<Booking> {
        if request.start_at >= request.end_at {
            return Err(BookingError::InvalidWindow.into());
        }

        let vehicle = self.load_vehicle(request.vehicle_id).await?;
        let delivery_fee = round_money(request.delivery_fee.unwrap_or(vehicle.delivery_fee));
        let total_price = compute_total(
            &request.start_at,
            &request.end_at,
            request.pricing_unit,
            &vehicle.rate_card(),
            delivery_fee,
        )?;

        let pickup_location = request
            .pickup_location
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| vehicle.pickup_location.clone());

        let new_booking = NewBooking {
            booking_code: generate_id(Utc::now()),
            customer_id,
            vehicle_id: vehicle.id,
            start_at: request.start_at,
            end_at: request.end_at,
            pickup_location,
            dropoff_location: request.dropoff_location.unwrap_or_default(),
            delivery_fee,
            pricing_unit: request.pricing_unit,
            total_price,
        };

        let booking = self.store.insert_if_available(new_booking).await?;
        info!(
            booking_code = %booking.booking_code,
            vehicle_id = %booking.vehicle_id,
            total_price = %booking.total_price,
            "Booking created"
        );
        Ok(booking)
    }

    /// Mueve una reserva pendiente a otra ventana y recalcula el total.
    /// El código de reserva no cambia.
    pub async fn reschedule(
        &self,
        customer_id: Uuid,
        booking_id: Uuid,
        request: RescheduleRequest,
    ) -> AppResult<Booking> {
        let booking = self.load_customer_booking(customer_id, booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::AlreadyTerminal(
                booking.status.as_str().to_string(),
                "reschedule".to_string(),
            )
            .into());
        }

        let vehicle = self
            .store
            .find_vehicle(booking.vehicle_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Vehicle".to_string()))?;

        let pricing_unit = request.pricing_unit.unwrap_or(booking.pricing_unit);
        let delivery_fee = round_money(request.delivery_fee.unwrap_or(booking.delivery_fee));
        let total_price = compute_total(
            &request.start_at,
            &request.end_at,
            pricing_unit,
            &vehicle.rate_card(),
            delivery_fee,
        )?;

        let updated = self
            .store
            .reschedule_if_available(BookingReschedule {
                booking_id: booking.id,
                start_at: request.start_at,
                end_at: request.end_at,
                pricing_unit,
                delivery_fee,
                total_price,
            })
            .await?;

        info!(booking_code = %updated.booking_code, "Booking rescheduled");
        Ok(updated)
    }

    async fn transition(&self, booking: Booking, event: BookingEvent) -> AppResult<Booking> {
        let next = booking.status.apply(event)?;
        match self.store.update_status(booking.id, booking.status, next).await? {
            Some(updated) => {
                info!(
                    booking_code = %updated.booking_code,
                    from = %booking.status,
                    to = %updated.status,
                    event = event.as_str(),
                    "Booking status changed"
                );
                Ok(updated)
            }
            None => {
                warn!(booking_id = %booking.id, "Booking status changed concurrently");
                Err(AppError::Conflict(
                    "Booking was modified concurrently, please retry".to_string(),
                ))
            }
        }
    }

    /// Cancelación por parte del cliente
    pub async fn cancel(&self, customer_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load_customer_booking(customer_id, booking_id).await?;
        self.transition(booking, BookingEvent::Cancel).await
    }

    /// Aprobación por parte del propietario del vehículo
    pub async fn approve(&self, owner_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load_owner_booking(owner_id, booking_id).await?;
        self.transition(booking, BookingEvent::Approve).await
    }

    /// Rechazo por parte del propietario del vehículo
    pub async fn reject(&self, owner_id: Uuid, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load_owner_booking(owner_id, booking_id).await?;
        self.transition(booking, BookingEvent::Reject).await
    }

    /// Crea un pago pendiente por el total de una reserva pendiente
    pub async fn checkout(&self, customer_id: Uuid, booking_id: Uuid) -> AppResult<Payment> {
        let booking = self.load_customer_booking(customer_id, booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::AlreadyTerminal(
                booking.status.as_str().to_string(),
                "checkout".to_string(),
            )
            .into());
        }

        let payment = self.store.create_payment(&booking).await?;
        info!(
            booking_code = %booking.booking_code,
            reference_id = %payment.reference_id,
            amount = %payment.amount,
            "Checkout started"
        );
        Ok(payment)
    }

    /// Procesa la notificación del proveedor de pagos.
    ///
    /// El pago se busca por `reference_id`; si no existe se crea uno nuevo
    /// para `booking_id`. Un estado `success` confirma la reserva aplicando
    /// `PaymentSucceeded`. Sobre una reserva ya confirmada el pago se registra
    /// sin cambios; sobre una cancelada se registra y se devuelve
    /// `AlreadyTerminal` dejando la reserva intacta.
    pub async fn handle_payment_webhook(
        &self,
        notification: PaymentNotification,
    ) -> AppResult<(Payment, Booking)> {
        let reference_id = notification
            .reference_id
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let existing = match reference_id.as_deref() {
            Some(reference) => self.store.find_payment_by_reference(reference).await?,
            None => None,
        };

        let booking = match &existing {
            Some(payment) => self.load_booking(payment.booking_id).await?,
            None => {
                let booking_id = notification
                    .booking_id
                    .ok_or_else(|| bad_request_error("reference_id or booking_id required"))?;
                self.load_booking(booking_id).await?
            }
        };

        let status = notification
            .status
            .or_else(|| existing.as_ref().map(|p| p.status))
            .unwrap_or(PaymentStatus::Pending);

        // El pago se guarda aunque la reserva no admita la transición
        let mut rejected = None;
        let booking_transition = if status == PaymentStatus::Success {
            match booking.status.apply(BookingEvent::PaymentSucceeded) {
                Ok(next) => Some((booking.status, next)),
                Err(_) if booking.status == BookingStatus::Confirmed => None,
                Err(err) => {
                    rejected = Some(err);
                    None
                }
            }
        } else {
            None
        };

        let record = PaymentRecord {
            payment_id: existing.as_ref().map(|p| p.id),
            booking_id: booking.id,
            reference_id: existing.as_ref().map(|p| p.reference_id.clone()).or(reference_id),
            status,
            amount: existing.as_ref().map(|p| p.amount).unwrap_or(booking.total_price),
            payload: notification.payload,
            booking_transition,
        };

        match self.store.record_payment(record).await? {
            Some((payment, booking)) => {
                if let Some(err) = rejected {
                    warn!(
                        reference_id = %payment.reference_id,
                        booking_status = %booking.status,
                        "Payment recorded for a booking that cannot be confirmed"
                    );
                    return Err(err.into());
                }
                info!(
                    reference_id = %payment.reference_id,
                    payment_status = %payment.status,
                    booking_status = %booking.status,
                    "Payment webhook processed"
                );
                Ok((payment, booking))
            }
            None => {
                warn!(booking_id = %booking.id, "Booking changed while processing payment webhook");
                Err(AppError::Conflict(
                    "Booking was modified concurrently, please retry".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::DEFAULT_PROVIDER;
    use crate::models::vehicle::VehicleType;
    use crate::services::availability_service::has_conflict;
    use crate::utils::booking_code::is_valid_booking_code;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryState {
        vehicles: Vec<Vehicle>,
        bookings: Vec<Booking>,
        payments: Vec<Payment>,
    }

    /// Store en memoria; el mutex hace atómico el check-and-insert
    #[derive(Clone, Default)]
    struct InMemoryBookingStore {
        state: Arc<Mutex<MemoryState>>,
    }

    #[async_trait]
    impl BookingStore for InMemoryBookingStore {
        async fn find_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Vehicle>> {
            let state = self.state.lock().await;
            Ok(state.vehicles.iter().find(|v| v.id == vehicle_id).cloned())
        }

        async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
            let state = self.state.lock().await;
            Ok(state.bookings.iter().find(|b| b.id == booking_id).cloned())
        }

        async fn insert_if_available(&self, booking: NewBooking) -> AppResult<Booking> {
            let mut state = self.state.lock().await;
            if has_conflict(booking.vehicle_id, booking.start_at, booking.end_at, &state.bookings) {
                return Err(BookingError::OverlapConflict.into());
            }
            let stored = Booking {
                id: Uuid::new_v4(),
                booking_code: booking.booking_code,
                customer_id: booking.customer_id,
                vehicle_id: booking.vehicle_id,
                start_at: booking.start_at,
                end_at: booking.end_at,
                pickup_location: booking.pickup_location,
                dropoff_location: booking.dropoff_location,
                delivery_fee: booking.delivery_fee,
                pricing_unit: booking.pricing_unit,
                total_price: booking.total_price,
                status: BookingStatus::Pending,
                created_at: Utc::now(),
            };
            state.bookings.push(stored.clone());
            Ok(stored)
        }

        async fn reschedule_if_available(&self, change: BookingReschedule) -> AppResult<Booking> {
            let mut state = self.state.lock().await;
            let vehicle_id = state
                .bookings
                .iter()
                .find(|b| b.id == change.booking_id && b.status == BookingStatus::Pending)
                .map(|b| b.vehicle_id)
                .ok_or_else(|| AppError::Conflict("Booking is no longer pending".to_string()))?;

            let others: Vec<&Booking> = state.bookings.iter().filter(|b| b.id != change.booking_id).collect();
            if has_conflict(vehicle_id, change.start_at, change.end_at, others) {
                return Err(BookingError::OverlapConflict.into());
            }

            let booking = state
                .bookings
                .iter_mut()
                .find(|b| b.id == change.booking_id)
                .ok_or_else(|| BookingError::NotFound("Booking".to_string()))?;
            booking.start_at = change.start_at;
            booking.end_at = change.end_at;
            booking.pricing_unit = change.pricing_unit;
            booking.delivery_fee = change.delivery_fee;
            booking.total_price = change.total_price;
            Ok(booking.clone())
        }

        async fn update_status(
            &self,
            booking_id: Uuid,
            expected: BookingStatus,
            next: BookingStatus,
        ) -> AppResult<Option<Booking>> {
            let mut state = self.state.lock().await;
            Ok(state
                .bookings
                .iter_mut()
                .find(|b| b.id == booking_id && b.status == expected)
                .map(|b| {
                    b.status = next;
                    b.clone()
                }))
        }

        async fn create_payment(&self, booking: &Booking) -> AppResult<Payment> {
            let mut state = self.state.lock().await;
            let id = Uuid::new_v4();
            let payment = Payment {
                id,
                booking_id: booking.id,
                provider: DEFAULT_PROVIDER.to_string(),
                reference_id: id.to_string(),
                status: PaymentStatus::Pending,
                amount: booking.total_price,
                payload: sqlx::types::Json(json!({})),
                created_at: Utc::now(),
            };
            state.payments.push(payment.clone());
            Ok(payment)
        }

        async fn find_payment_by_reference(&self, reference_id: &str) -> AppResult<Option<Payment>> {
            let state = self.state.lock().await;
            Ok(state.payments.iter().find(|p| p.reference_id == reference_id).cloned())
        }

        async fn record_payment(&self, record: PaymentRecord) -> AppResult<Option<(Payment, Booking)>> {
            let mut state = self.state.lock().await;

            let booking_index = state
                .bookings
                .iter()
                .position(|b| b.id == record.booking_id)
                .ok_or_else(|| BookingError::NotFound("Booking".to_string()))?;
            if let Some((expected, _)) = record.booking_transition {
                if state.bookings[booking_index].status != expected {
                    return Ok(None);
                }
            }

            let payment = match record.payment_id {
                Some(id) => {
                    let payment = state
                        .payments
                        .iter_mut()
                        .find(|p| p.id == id)
                        .ok_or_else(|| BookingError::NotFound("Payment".to_string()))?;
                    payment.status = record.status;
                    payment.payload = sqlx::types::Json(record.payload);
                    payment.clone()
                }
                None => {
                    let id = Uuid::new_v4();
                    let payment = Payment {
                        id,
                        booking_id: record.booking_id,
                        provider: DEFAULT_PROVIDER.to_string(),
                        reference_id: record.reference_id.unwrap_or_else(|| id.to_string()),
                        status: record.status,
                        amount: record.amount,
                        payload: sqlx::types::Json(record.payload),
                        created_at: Utc::now(),
                    };
                    state.payments.push(payment.clone());
                    payment
                }
            };

            if let Some((_, next)) = record.booking_transition {
                state.bookings[booking_index].status = next;
            }
            Ok(Some((payment, state.bookings[booking_index].clone())))
        }
    }

    fn vehicle(owner_id: Uuid) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            owner_id,
            title: "Swift 2022".to_string(),
            description: String::new(),
            city: "Pune".to_string(),
            location: "Baner".to_string(),
            pickup_location: "Baner depot".to_string(),
            vehicle_type: VehicleType::Hatchback,
            make: "Maruti".to_string(),
            model: "Swift".to_string(),
            year: Some(2022),
            seats: 5,
            transmission: "manual".to_string(),
            hourly_rate: dec!(100.00),
            daily_rate: dec!(1000.00),
            weekly_rate: dec!(5000.00),
            delivery_fee: dec!(150.00),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    struct Fixture {
        service: BookingService<InMemoryBookingStore>,
        store: InMemoryBookingStore,
        owner: Uuid,
        customer: Uuid,
        vehicle_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryBookingStore::default();
        let owner = Uuid::new_v4();
        let v = vehicle(owner);
        let vehicle_id = v.id;
        store.state.lock().await.vehicles.push(v);
        Fixture {
            service: BookingService::new(store.clone()),
            store,
            owner,
            customer: Uuid::new_v4(),
            vehicle_id,
        }
    }

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn request(vehicle_id: Uuid, start: i64, end: i64, unit: PricingUnit) -> BookingRequest {
        BookingRequest {
            vehicle_id,
            start_at: at(start),
            end_at: at(end),
            pricing_unit: unit,
            delivery_fee: None,
            pickup_location: None,
            dropoff_location: None,
        }
    }

    fn webhook(reference_id: Option<&str>, booking_id: Option<Uuid>, status: Option<PaymentStatus>) -> PaymentNotification {
        PaymentNotification {
            reference_id: reference_id.map(str::to_string),
            booking_id,
            status,
            payload: json!({ "source": "test" }),
        }
    }

    // ==================== create tests ====================

    #[tokio::test]
    async fn test_create_booking_prices_and_defaults() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 10, 34, PricingUnit::Daily))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.delivery_fee, dec!(150.00));
        assert_eq!(booking.total_price.to_string(), "1150.00");
        assert_eq!(booking.pickup_location, "Baner depot");
        assert_eq!(booking.dropoff_location, "");
        assert!(is_valid_booking_code(&booking.booking_code));
    }

    #[tokio::test]
    async fn test_create_booking_with_fee_override() {
        let f = fixture().await;
        let mut req = request(f.vehicle_id, 10, 11, PricingUnit::Hourly);
        req.delivery_fee = Some(dec!(0));
        req.pickup_location = Some("Airport".to_string());
        let booking = f.service.create_booking(f.customer, req).await.unwrap();

        assert_eq!(booking.total_price, dec!(100.00));
        assert_eq!(booking.pickup_location, "Airport");
    }

    #[tokio::test]
    async fn test_overlapping_booking_is_rejected() {
        let f = fixture().await;
        f.service
            .create_booking(f.customer, request(f.vehicle_id, 10, 12, PricingUnit::Hourly))
            .await
            .unwrap();

        let err = f
            .service
            .create_booking(Uuid::new_v4(), request(f.vehicle_id, 11, 13, PricingUnit::Hourly))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::OverlapConflict)));

        // Ventana contigua permitida
        f.service
            .create_booking(Uuid::new_v4(), request(f.vehicle_id, 12, 14, PricingUnit::Hourly))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_the_window() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 10, 12, PricingUnit::Hourly))
            .await
            .unwrap();
        f.service.cancel(f.customer, booking.id).await.unwrap();

        f.service
            .create_booking(Uuid::new_v4(), request(f.vehicle_id, 10, 12, PricingUnit::Hourly))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_window_and_unknown_vehicle() {
        let f = fixture().await;
        let err = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 10, 10, PricingUnit::Hourly))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::InvalidWindow)));

        let err = f
            .service
            .create_booking(f.customer, request(Uuid::new_v4(), 10, 12, PricingUnit::Hourly))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_creates_only_one_wins() {
        let f = fixture().await;
        let service = Arc::new(f.service);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let vehicle_id = f.vehicle_id;
            handles.push(tokio::spawn(async move {
                service
                    .create_booking(Uuid::new_v4(), request(vehicle_id, 10, 12, PricingUnit::Hourly))
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(f.store.state.lock().await.bookings.len(), 1);
    }

    // ==================== status tests ====================

    #[tokio::test]
    async fn test_cancel_pending_and_confirmed() {
        let f = fixture().await;
        let first = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();
        let cancelled = f.service.cancel(f.customer, first.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let second = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 4, 6, PricingUnit::Hourly))
            .await
            .unwrap();
        f.service.approve(f.owner, second.id).await.unwrap();
        let cancelled = f.service.cancel(f.customer, second.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_already_terminal() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();
        f.service.cancel(f.customer, booking.id).await.unwrap();

        let err = f.service.cancel(f.customer, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AlreadyTerminal(_, _))));
    }

    #[tokio::test]
    async fn test_approve_and_reject_rules() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();

        let approved = f.service.approve(f.owner, booking.id).await.unwrap();
        assert_eq!(approved.status, BookingStatus::Confirmed);

        let err = f.service.approve(f.owner, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AlreadyTerminal(_, _))));

        let err = f.service.reject(f.owner, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AlreadyTerminal(_, _))));
    }

    #[tokio::test]
    async fn test_foreign_bookings_are_not_found() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();

        let err = f.service.cancel(Uuid::new_v4(), booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::NotFound(_))));

        let err = f.service.approve(Uuid::new_v4(), booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::NotFound(_))));
    }

    // ==================== reschedule tests ====================

    #[tokio::test]
    async fn test_reschedule_keeps_code_and_recomputes_total() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 1, PricingUnit::Hourly))
            .await
            .unwrap();

        let updated = f
            .service
            .reschedule(
                f.customer,
                booking.id,
                RescheduleRequest {
                    // Se solapa con su propia ventana anterior
                    start_at: at(0),
                    end_at: at(3),
                    pricing_unit: None,
                    delivery_fee: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.booking_code, booking.booking_code);
        assert_eq!(updated.total_price, dec!(450.00));

        let cancelled = f.service.cancel(f.customer, booking.id).await.unwrap();
        assert_eq!(cancelled.booking_code, booking.booking_code);
    }

    #[tokio::test]
    async fn test_reschedule_into_other_booking_conflicts() {
        let f = fixture().await;
        let mine = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 1, PricingUnit::Hourly))
            .await
            .unwrap();
        f.service
            .create_booking(Uuid::new_v4(), request(f.vehicle_id, 5, 6, PricingUnit::Hourly))
            .await
            .unwrap();

        let err = f
            .service
            .reschedule(
                f.customer,
                mine.id,
                RescheduleRequest {
                    start_at: at(4),
                    end_at: at(6),
                    pricing_unit: Some(PricingUnit::Hourly),
                    delivery_fee: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::OverlapConflict)));
    }

    // ==================== quote / checkout / webhook tests ====================

    #[tokio::test]
    async fn test_quote_uses_vehicle_fee() {
        let f = fixture().await;
        let quote = f
            .service
            .quote(f.vehicle_id, at(0), at(24), PricingUnit::Daily, None)
            .await
            .unwrap();
        assert_eq!(quote.total_price, dec!(1150.00));
        assert_eq!(quote.hours, dec!(24.00));

        let err = f
            .service
            .quote(f.vehicle_id, at(5), at(1), PricingUnit::Daily, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::InvalidWindow)));
    }

    #[tokio::test]
    async fn test_checkout_then_success_webhook_confirms() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();

        let payment = f.service.checkout(f.customer, booking.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, booking.total_price);
        assert_eq!(payment.reference_id, payment.id.to_string());

        let (payment, confirmed) = f
            .service
            .handle_payment_webhook(webhook(Some(&payment.reference_id), None, Some(PaymentStatus::Success)))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(payment.payload.0, json!({ "source": "test" }));

        // Ya no está pendiente
        let err = f.service.checkout(f.customer, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AlreadyTerminal(_, _))));
    }

    #[tokio::test]
    async fn test_webhook_by_booking_id_creates_payment() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();

        let (payment, unchanged) = f
            .service
            .handle_payment_webhook(webhook(Some("cf_123"), Some(booking.id), Some(PaymentStatus::Failed)))
            .await
            .unwrap();
        assert_eq!(payment.reference_id, "cf_123");
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.amount, booking.total_price);
        assert_eq!(unchanged.status, BookingStatus::Pending);

        // Sin estado conserva el anterior
        let (payment, _) = f
            .service
            .handle_payment_webhook(webhook(Some("cf_123"), None, None))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(f.store.state.lock().await.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_errors() {
        let f = fixture().await;

        let err = f
            .service
            .handle_payment_webhook(webhook(None, None, Some(PaymentStatus::Success)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = f
            .service
            .handle_payment_webhook(webhook(Some("missing"), Some(Uuid::new_v4()), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_success_webhook_on_cancelled_booking_records_payment() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();
        f.service.cancel(f.customer, booking.id).await.unwrap();

        let err = f
            .service
            .handle_payment_webhook(webhook(Some("cf_late"), Some(booking.id), Some(PaymentStatus::Success)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AlreadyTerminal(_, _))));

        // El cobro queda registrado aunque la reserva siga cancelada
        let state = f.store.state.lock().await;
        assert_eq!(state.payments.len(), 1);
        assert_eq!(state.payments[0].reference_id, "cf_late");
        assert_eq!(state.payments[0].status, PaymentStatus::Success);
        assert_eq!(state.bookings[0].status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_success_webhook_after_owner_approval_is_recorded() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(f.customer, request(f.vehicle_id, 0, 2, PricingUnit::Hourly))
            .await
            .unwrap();
        let payment = f.service.checkout(f.customer, booking.id).await.unwrap();
        f.service.approve(f.owner, booking.id).await.unwrap();

        let (recorded, confirmed) = f
            .service
            .handle_payment_webhook(webhook(Some(&payment.reference_id), None, Some(PaymentStatus::Success)))
            .await
            .unwrap();
        assert_eq!(recorded.id, payment.id);
        assert_eq!(recorded.status, PaymentStatus::Success);
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        // Un reintento del proveedor tampoco falla
        let (retried, _) = f
            .service
            .handle_payment_webhook(webhook(Some(&payment.reference_id), None, Some(PaymentStatus::Success)))
            .await
            .unwrap();
        assert_eq!(retried.status, PaymentStatus::Success);
        assert_eq!(f.store.state.lock().await.payments.len(), 1);
    }

    // ==================== amount range tests ====================

    #[tokio::test]
    async fn test_unstorable_delivery_fee_is_rejected() {
        let f = fixture().await;
        let mut req = request(f.vehicle_id, 10, 11, PricingUnit::Hourly);
        req.delivery_fee = Some(Decimal::MAX);
        let err = f.service.create_booking(f.customer, req).await.unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AmountOutOfRange(_))));
        assert!(f.store.state.lock().await.bookings.is_empty());

        let err = f
            .service
            .quote(f.vehicle_id, at(0), at(1), PricingUnit::Hourly, Some(Decimal::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AmountOutOfRange(_))));
    }

    #[tokio::test]
    async fn test_quote_rejects_negative_delivery_fee() {
        let f = fixture().await;
        let err = f
            .service
            .quote(f.vehicle_id, at(0), at(1), PricingUnit::Hourly, Some(dec!(-100)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Booking(BookingError::AmountOutOfRange(_))));
    }
}
