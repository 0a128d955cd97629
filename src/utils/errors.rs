//! Sistema de manejo de errores
//!
//! Este módulo define los errores de dominio de reservas, los errores
//! de la aplicación y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores del motor de reservas (precio, disponibilidad, estados)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Start time must be before end time")]
    InvalidWindow,

    #[error("Timestamp '{0}' must carry a timezone offset")]
    NaiveTimestamp(String),

    #[error("Unknown pricing unit '{0}' (expected hourly, daily or weekly)")]
    UnknownPricingUnit(String),

    #[error("Vehicle is not available in the selected time window")]
    OverlapConflict,

    #[error("Booking is already {0}; transition '{1}' is not allowed")]
    AlreadyTerminal(String, String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Amount '{0}' is outside the supported range")]
    AmountOutOfRange(&'static str),
}

impl BookingError {
    /// Código estable expuesto en las respuestas de error
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidWindow => "INVALID_WINDOW",
            BookingError::NaiveTimestamp(_) => "NAIVE_TIMESTAMP",
            BookingError::UnknownPricingUnit(_) => "UNKNOWN_PRICING_UNIT",
            BookingError::OverlapConflict => "OVERLAP_CONFLICT",
            BookingError::AlreadyTerminal(..) => "ALREADY_TERMINAL",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidWindow
            | BookingError::NaiveTimestamp(_)
            | BookingError::UnknownPricingUnit(_)
            | BookingError::AmountOutOfRange(_) => StatusCode::BAD_REQUEST,
            BookingError::OverlapConflict | BookingError::AlreadyTerminal(..) => StatusCode::CONFLICT,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Database Error",
                        "An error occurred while accessing the database".to_string(),
                        "DB_ERROR",
                    ),
                )
            }

            AppError::Validation(e) => {
                tracing::debug!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        details: Some(json!(e)),
                        ..ErrorResponse::new(
                            "Validation Error",
                            "The provided data is invalid".to_string(),
                            "VALIDATION_ERROR",
                        )
                    },
                )
            }

            AppError::Booking(e) => {
                tracing::debug!("Booking rejected: {}", e);
                (
                    e.status_code(),
                    ErrorResponse::new("Booking Error", e.to_string(), e.code()),
                )
            }

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED"),
            ),

            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("Forbidden", msg, "FORBIDDEN"),
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("Not Found", msg, "NOT_FOUND"),
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("Conflict", msg, "CONFLICT"),
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),
            ),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Internal Server Error",
                        "An unexpected error occurred".to_string(),
                        "INTERNAL_ERROR",
                    ),
                )
            }

            AppError::Jwt(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("JWT Error", msg, "JWT_ERROR"),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Convierte una violación de unicidad de Postgres (23505) en el error dado
pub fn map_unique_violation<F>(err: sqlx::Error, on_conflict: F) -> AppError
where
    F: FnOnce() -> AppError,
{
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => on_conflict(),
        _ => AppError::Database(err),
    }
}
