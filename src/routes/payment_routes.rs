use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;

use crate::controllers::payment_controller::PaymentController;
use crate::dto::common::ApiResponse;
use crate::dto::payment_dto::PaymentResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router() -> Router<AppState> {
    Router::new().route("/webhook", post(payment_webhook))
}

async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<PaymentResponse>>, AppError> {
    let controller = PaymentController::new(state.pool.clone());
    let response = controller.webhook(body).await?;
    Ok(Json(response))
}
