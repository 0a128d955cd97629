//! Backend de alquiler de vehículos
//!
//! Tarifas, disponibilidad y ciclo de vida de reservas expuestos como API
//! HTTP con Axum sobre PostgreSQL.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación con sus capas
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .nest("/api/vehicles", routes::create_vehicle_router(state.clone()))
        .nest("/api/filters", routes::create_filter_router())
        .nest("/api/bookings", routes::create_booking_router(state.clone()))
        .nest("/api/owner-bookings", routes::create_owner_booking_router(state.clone()))
        .nest("/api/payments", routes::create_payment_router())
        .nest("/api/reviews", routes::create_review_router(state.clone()))
        .nest("/api/favorites", routes::create_favorite_router(state.clone()))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
