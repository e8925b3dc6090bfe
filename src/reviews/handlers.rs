use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate::checked_email;

use super::dto::CreateReviewRequest;
use super::repo::{self, NewReview, Review};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/products/:id/reviews", get(product_reviews))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/products/:id/reviews", post(create_review))
}

#[instrument(skip(state))]
pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = repo::list_all(&state.db).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = repo::list_by_product(&state.db, id).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let reviewer_email = checked_email(&payload.reviewer_email)?;
    if !(0.0..=5.0).contains(&payload.rating) {
        return Err(ApiError::Validation("rating must be between 0 and 5".into()));
    }
    let review = repo::create(
        &state.db,
        NewReview {
            product_id: id,
            reviewer_email,
            reviewer_name: payload.reviewer_name,
            reviewer_image: payload.reviewer_image,
            rating: payload.rating,
            comment: payload.comment,
        },
    )
    .await?;
    info!(review_id = %review.id, product_id = %id, "review posted");
    Ok((StatusCode::CREATED, Json(review)))
}
