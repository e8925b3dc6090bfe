use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate::checked_email;

use super::dto::{PromoteRequest, RegisterRequest, RoleResponse, VerifySubscriptionRequest};
use super::repo::{self, Role, User};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:email", get(get_user))
        .route("/users/:email/role", get(get_role))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/:email/role", patch(promote))
        .route("/users/:email/subscription", patch(verify_subscription))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = repo::list(&state.db).await?;
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = checked_email(&payload.email)?;
    let (user, created) = repo::register(&state.db, &email, payload.name.as_deref()).await?;
    if created {
        info!(email = %user.email, "user registered");
        Ok((StatusCode::CREATED, Json(user)))
    } else {
        info!(email = %user.email, "user already registered");
        Ok((StatusCode::OK, Json(user)))
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let email = checked_email(&email)?;
    let user = repo::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, ApiError> {
    let email = checked_email(&email)?;
    let role = repo::role(&state.db, &email).await?;
    Ok(Json(RoleResponse { role }))
}

#[instrument(skip(state, payload))]
pub async fn promote(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<PromoteRequest>,
) -> Result<Json<User>, ApiError> {
    let email = checked_email(&email)?;
    let role: Role = payload.role.parse()?;
    let user = repo::promote(&state.db, &email, role).await?;
    info!(email = %user.email, role = %user.role, "role escalated");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn verify_subscription(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<VerifySubscriptionRequest>,
) -> Result<Json<User>, ApiError> {
    let email = checked_email(&email)?;
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        warn!(%email, amount = payload.amount, "rejected subscription amount");
        return Err(ApiError::Validation("amount must be a positive number".into()));
    }
    if payload.transaction_ref.trim().is_empty() {
        return Err(ApiError::Validation("transaction_ref is required".into()));
    }
    let user = repo::verify_subscription(
        &state.db,
        &email,
        payload.amount,
        payload.transaction_ref.trim(),
    )
    .await?;
    info!(email = %user.email, "subscription verified");
    Ok(Json(user))
}
