use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate::checked_email;

use super::dto::{
    CreateProductRequest, FlagParams, SearchParams, SetStatusRequest, TrendingParams, VoteRequest,
    VoteResponse,
};
use super::repo::{self, NewProduct, Product, ProductFlag, ProductPatch, ProductStatus};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(search_products))
        .route("/products/all", get(list_all_products))
        .route("/products/featured", get(featured_products))
        .route("/products/reported", get(reported_products))
        .route("/products/trending", get(trending_products))
        .route("/products/owner/:email", get(products_by_owner))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route("/products/:id/status", patch(set_product_status))
        .route("/products/:id/accept", patch(accept_product))
        .route("/products/:id/reject", patch(reject_product))
        .route("/products/:id/feature", patch(feature_product))
        .route("/products/:id/report", patch(report_product))
        .route("/products/:id/vote", post(vote_product))
}

#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let items = repo::search_accepted(&state.db, p.q.as_deref().unwrap_or("")).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn list_all_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let items = repo::list_all(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let items = repo::featured(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn reported_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let items = repo::reported(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn trending_products(
    State(state): State<AppState>,
    Query(p): Query<TrendingParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let limit = p.limit.clamp(1, 50);
    let items = repo::trending(&state.db, limit).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn products_by_owner(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let email = checked_email(&email)?;
    let items = repo::list_by_owner(&state.db, &email).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = repo::get(&state.db, id).await?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let owner_email = checked_email(&payload.owner_email)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    let product = repo::create(
        &state.db,
        NewProduct {
            owner_email,
            name: name.to_string(),
            image: payload.image,
            description: payload.description,
            tags: payload.tags,
            external_link: payload.external_link,
        },
    )
    .await?;
    info!(product_id = %product.id, owner = %product.owner_email, "product submitted");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, patch))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    if patch.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    let product = repo::update_fields(&state.db, id, patch).await?;
    info!(product_id = %product.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    repo::delete(&state.db, id).await?;
    info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<StatusCode, ApiError> {
    let status: ProductStatus = payload.status.parse()?;
    repo::set_status(&state.db, id, status).await?;
    info!(product_id = %id, %status, "status changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn accept_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    repo::set_status(&state.db, id, ProductStatus::Accepted).await?;
    info!(product_id = %id, "product accepted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn reject_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    repo::set_status(&state.db, id, ProductStatus::Rejected).await?;
    info!(product_id = %id, "product rejected");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn feature_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(p): Query<FlagParams>,
) -> Result<StatusCode, ApiError> {
    repo::set_flag(&state.db, id, ProductFlag::Featured, p.value).await?;
    info!(product_id = %id, value = p.value, "featured flag set");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn report_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(p): Query<FlagParams>,
) -> Result<StatusCode, ApiError> {
    repo::set_flag(&state.db, id, ProductFlag::Reported, p.value).await?;
    info!(product_id = %id, value = p.value, "reported flag set");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn vote_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let voter = checked_email(&payload.email)?;
    let upvotes = repo::cast_vote(&state.db, id, &voter).await?;
    info!(product_id = %id, voter = %voter, upvotes, "vote recorded");
    Ok(Json(VoteResponse { upvotes }))
}
