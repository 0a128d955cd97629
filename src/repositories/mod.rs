//! Repositorios de acceso a PostgreSQL

pub mod booking_repository;
pub mod favorite_repository;
pub mod review_repository;
pub mod vehicle_repository;
