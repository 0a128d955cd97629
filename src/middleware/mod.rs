//! Middleware del sistema: autenticación, roles y CORS

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, customer_only_middleware, owner_only_middleware, require_role};
pub use cors::cors_layer;
