//! Controladores: orquestan validación, servicios y repositorios por recurso

pub mod booking_controller;
pub mod favorite_controller;
pub mod payment_controller;
pub mod review_controller;
pub mod vehicle_controller;
