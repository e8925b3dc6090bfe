use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::dto::CouponPatch;
use super::repo::{self, Coupon};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/coupons", get(list_coupons))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/coupons", post(create_coupon))
        .route("/coupons/:id", put(update_coupon).delete(delete_coupon))
}

#[instrument(skip(state))]
pub async fn list_coupons(State(state): State<AppState>) -> Result<Json<Vec<Coupon>>, ApiError> {
    let coupons = repo::list(&state.db).await?;
    Ok(Json(coupons))
}

#[instrument(skip(state, payload))]
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CouponPatch>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    validate_coupon(&payload)?;
    let coupon = repo::create(&state.db, payload).await?;
    info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[instrument(skip(state, payload))]
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CouponPatch>,
) -> Result<Json<Coupon>, ApiError> {
    validate_coupon(&payload)?;
    let coupon = repo::update(&state.db, id, payload).await?;
    info!(coupon_id = %coupon.id, "coupon updated");
    Ok(Json(coupon))
}

#[instrument(skip(state))]
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    repo::delete(&state.db, id).await?;
    info!(coupon_id = %id, "coupon deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_coupon(payload: &CouponPatch) -> Result<(), ApiError> {
    if payload.code.trim().is_empty() {
        return Err(ApiError::Validation("code is required".into()));
    }
    if !payload.discount_amount.is_finite() || payload.discount_amount <= 0.0 {
        return Err(ApiError::Validation(
            "discount_amount must be a positive number".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample(code: &str, amount: f64) -> CouponPatch {
        CouponPatch {
            code: code.into(),
            expiry_date: date!(2026 - 12 - 31),
            discount_amount: amount,
            description: None,
        }
    }

    #[test]
    fn rejects_blank_code() {
        let err = validate_coupon(&sample("  ", 5.0)).unwrap_err();
        assert!(err.to_string().contains("code is required"));
    }

    #[test]
    fn rejects_non_positive_discount() {
        assert!(validate_coupon(&sample("SAVE10", 0.0)).is_err());
        assert!(validate_coupon(&sample("SAVE10", -3.0)).is_err());
        assert!(validate_coupon(&sample("SAVE10", f64::NAN)).is_err());
    }

    #[test]
    fn accepts_well_formed_coupon() {
        assert!(validate_coupon(&sample("SAVE10", 10.0)).is_ok());
    }
}
