//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! JWT y generación de códigos de reserva.

pub mod booking_code;
pub mod errors;
pub mod jwt;
pub mod validation;
