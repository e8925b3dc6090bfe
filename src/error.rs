use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Outcome taxonomy for every core operation. `Conflict`, `AlreadyVoted` and
/// `QuotaExceeded` are terminal, user-facing precondition failures and are
/// never retried here; only `Upstream` is worth a caller-side retry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you have already voted for this product")]
    AlreadyVoted,
    #[error("submission limit reached; subscribe to add more products")]
    QuotaExceeded,
    #[error("invalid value: {0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("upstream service unavailable")]
    Upstream(anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Upstream(anyhow::Error::new(e).context("persistence gateway"))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyVoted | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::QuotaExceeded => StatusCode::FORBIDDEN,
            ApiError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
