use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;

time::serde::format_description!(date_ymd, Date, "[year]-[month]-[day]");

/// Flat promotional record; no relationship to products.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub expiry_date: Date,
    pub discount_amount: f64,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouponPatch {
    pub code: String,
    #[serde(with = "date_ymd")]
    pub expiry_date: Date,
    pub discount_amount: f64,
    pub description: Option<String>,
}

pub async fn list(db: &PgPool) -> Result<Vec<Coupon>, ApiError> {
    let coupons = sqlx::query_as::<_, Coupon>(
        r#"
        SELECT id, code, expiry_date, discount_amount, description, created_at
        FROM coupons
        ORDER BY expiry_date ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(coupons)
}

pub async fn create(db: &PgPool, input: CouponPatch) -> Result<Coupon, ApiError> {
    let coupon = sqlx::query_as::<_, Coupon>(
        r#"
        INSERT INTO coupons (code, expiry_date, discount_amount, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, code, expiry_date, discount_amount, description, created_at
        "#,
    )
    .bind(&input.code)
    .bind(input.expiry_date)
    .bind(input.discount_amount)
    .bind(&input.description)
    .fetch_one(db)
    .await?;
    Ok(coupon)
}

pub async fn update(db: &PgPool, id: Uuid, patch: CouponPatch) -> Result<Coupon, ApiError> {
    sqlx::query_as::<_, Coupon>(
        r#"
        UPDATE coupons
        SET code = $2, expiry_date = $3, discount_amount = $4, description = $5
        WHERE id = $1
        RETURNING id, code, expiry_date, discount_amount, description, created_at
        "#,
    )
    .bind(id)
    .bind(&patch.code)
    .bind(patch.expiry_date)
    .bind(patch.discount_amount)
    .bind(&patch.description)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("coupon"))
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let res = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("coupon"));
    }
    Ok(())
}
