//! DTOs de la API
//!
//! Requests y responses de los endpoints HTTP.

pub mod booking_dto;
pub mod common;
pub mod favorite_dto;
pub mod payment_dto;
pub mod review_dto;
pub mod vehicle_dto;

pub use common::ApiResponse;
