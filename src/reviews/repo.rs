use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Reviews are append-only: there is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub reviewer_email: String,
    pub reviewer_name: Option<String>,
    pub reviewer_image: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub reviewer_email: String,
    pub reviewer_name: Option<String>,
    pub reviewer_image: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
}

pub async fn list_all(db: &PgPool) -> Result<Vec<Review>, ApiError> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, product_id, reviewer_email, reviewer_name, reviewer_image,
               rating, comment, created_at
        FROM reviews
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(reviews)
}

pub async fn list_by_product(db: &PgPool, product_id: Uuid) -> Result<Vec<Review>, ApiError> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, product_id, reviewer_email, reviewer_name, reviewer_image,
               rating, comment, created_at
        FROM reviews
        WHERE product_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(db)
    .await?;
    Ok(reviews)
}

pub async fn create(db: &PgPool, input: NewReview) -> Result<Review, ApiError> {
    sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, reviewer_email, reviewer_name, reviewer_image,
                             rating, comment)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, product_id, reviewer_email, reviewer_name, reviewer_image,
                  rating, comment, created_at
        "#,
    )
    .bind(input.product_id)
    .bind(&input.reviewer_email)
    .bind(&input.reviewer_name)
    .bind(&input.reviewer_image)
    .bind(input.rating)
    .bind(&input.comment)
    .fetch_one(db)
    .await
    .map_err(|e| match &e {
        // Foreign-key violation: the product this review points at is gone.
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            ApiError::NotFound("product")
        }
        _ => ApiError::from(e),
    })
}
