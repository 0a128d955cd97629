//! Lógica de negocio: tarifas, disponibilidad y ciclo de vida de reservas

pub mod availability_service;
pub mod booking_service;
pub mod pricing_service;

pub use booking_service::{BookingService, BookingStore};
