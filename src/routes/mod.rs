//! Routers HTTP por recurso

pub mod booking_routes;
pub mod favorite_routes;
pub mod owner_booking_routes;
pub mod payment_routes;
pub mod review_routes;
pub mod vehicle_routes;

pub use booking_routes::create_booking_router;
pub use favorite_routes::create_favorite_router;
pub use owner_booking_routes::create_owner_booking_router;
pub use payment_routes::create_payment_router;
pub use review_routes::create_review_router;
pub use vehicle_routes::{create_filter_router, create_vehicle_router};
