use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{PaymentIntentRequest, PaymentIntentResponse};

pub fn routes() -> Router<AppState> {
    Router::new().route("/billing/payment-intent", post(create_payment_intent))
}

/// Major units to integer minor units, rounding to the nearest cent.
/// None for anything that is not a positive finite price.
pub fn to_minor_units(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    Some((price * 100.0).round() as i64)
}

#[instrument(skip(state, payload))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let amount = to_minor_units(payload.price)
        .ok_or_else(|| ApiError::Validation("price must be a positive number".into()))?;
    let client_secret = state
        .payments
        .create_payment_intent(amount, &state.config.stripe.currency)
        .await
        .map_err(ApiError::Upstream)?;
    info!(amount_minor = amount, "payment intent created");
    Ok(Json(PaymentIntentResponse { client_secret }))
}
