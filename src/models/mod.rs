//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean
//! al schema PostgreSQL del marketplace de alquiler.

pub mod booking;
pub mod favorite;
pub mod payment;
pub mod review;
pub mod user;
pub mod vehicle;
