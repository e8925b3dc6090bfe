use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo::SubscriptionStatus;

/// Flat, re-assignable moderation status. A moderator may move a product
/// between any two states; `featured`/`reported` are orthogonal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Accepted => "accepted",
            ProductStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "accepted" => Ok(ProductStatus::Accepted),
            "rejected" => Ok(ProductStatus::Rejected),
            other => Err(ApiError::InvalidState(format!(
                "unknown product status: {other}"
            ))),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of boolean moderation flags; selects the column, so no client
/// input ever reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFlag {
    Featured,
    Reported,
}

impl ProductFlag {
    fn column(self) -> &'static str {
        match self {
            ProductFlag::Featured => "featured",
            ProductFlag::Reported => "reported",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub owner_email: String,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub external_link: Option<String>,
    pub status: String,
    pub featured: bool,
    pub reported: bool,
    pub upvotes: i32,
    pub voters: Vec<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub owner_email: String,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub external_link: Option<String>,
}

/// Editable fields only. Owner, status, flags and the tally cannot be
/// expressed here, so a crafted payload cannot inject them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPatch {
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub external_link: Option<String>,
}

/// Quota-enforced submission. Authorization and insert run in one
/// transaction serialized per owner through an advisory lock, which holds
/// across stateless instances and releases on commit or rollback. Two
/// concurrent submissions from the same unverified owner can never both
/// observe a zero count.
pub async fn create(db: &PgPool, input: NewProduct) -> Result<Product, ApiError> {
    let mut tx = db.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&input.owner_email)
        .execute(&mut *tx)
        .await?;

    let subscription = sqlx::query_scalar::<_, String>(
        "SELECT subscription_status FROM users WHERE email = $1",
    )
    .bind(&input.owner_email)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    if subscription != SubscriptionStatus::Verified.as_str() {
        let live: i64 =
            sqlx::query_scalar("SELECT count(*) FROM products WHERE owner_email = $1")
                .bind(&input.owner_email)
                .fetch_one(&mut *tx)
                .await?;
        if live >= 1 {
            return Err(ApiError::QuotaExceeded);
        }
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (owner_email, name, image, description, tags, external_link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, owner_email, name, image, description, tags, external_link,
                  status, featured, reported, upvotes, voters, created_at
        "#,
    )
    .bind(&input.owner_email)
    .bind(&input.name)
    .bind(&input.image)
    .bind(&input.description)
    .bind(&input.tags)
    .bind(&input.external_link)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(product)
}

/// At-most-one-vote-per-user, enforced by a single conditional update: the
/// dedup check is the statement's own predicate and the tally is derived
/// from the stored value, never taken from the client. Returns the new tally.
pub async fn cast_vote(db: &PgPool, id: Uuid, voter_email: &str) -> Result<i32, ApiError> {
    let tally = sqlx::query_scalar::<_, i32>(
        r#"
        UPDATE products
        SET voters = array_append(voters, $2),
            upvotes = upvotes + 1
        WHERE id = $1 AND NOT ($2 = ANY(voters))
        RETURNING upvotes
        "#,
    )
    .bind(id)
    .bind(voter_email)
    .fetch_optional(db)
    .await?;

    match tally {
        Some(tally) => Ok(tally),
        // The update missed: either the product is gone or the voter is
        // already recorded. The classifying read mutates nothing.
        None => {
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                    .bind(id)
                    .fetch_one(db)
                    .await?;
            if exists {
                Err(ApiError::AlreadyVoted)
            } else {
                Err(ApiError::NotFound("product"))
            }
        }
    }
}

pub async fn set_status(db: &PgPool, id: Uuid, status: ProductStatus) -> Result<(), ApiError> {
    let res = sqlx::query("UPDATE products SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("product"));
    }
    Ok(())
}

pub async fn set_flag(
    db: &PgPool,
    id: Uuid,
    flag: ProductFlag,
    value: bool,
) -> Result<(), ApiError> {
    let sql = format!("UPDATE products SET {} = $2 WHERE id = $1", flag.column());
    let res = sqlx::query(&sql).bind(id).bind(value).execute(db).await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("product"));
    }
    Ok(())
}

/// Rewrites the editable fields of an existing product. Plain conditional
/// update: a missing id fails `NotFound` rather than materializing a partial
/// record.
pub async fn update_fields(db: &PgPool, id: Uuid, patch: ProductPatch) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, image = $3, description = $4, tags = $5, external_link = $6
        WHERE id = $1
        RETURNING id, owner_email, name, image, description, tags, external_link,
                  status, featured, reported, upvotes, voters, created_at
        "#,
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.image)
    .bind(&patch.description)
    .bind(&patch.tags)
    .bind(&patch.external_link)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("product"))
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("product"))
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let res = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("product"));
    }
    Ok(())
}

pub async fn list_all(db: &PgPool) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(products)
}

/// Public catalog view: accepted products whose tag list contains the query
/// as a case-insensitive substring.
pub async fn search_accepted(db: &PgPool, q: &str) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        WHERE status = $1
          AND EXISTS (
              SELECT 1 FROM unnest(tags) AS tag
              WHERE tag ILIKE '%' || $2 || '%'
          )
        ORDER BY created_at DESC
        "#,
    )
    .bind(ProductStatus::Accepted.as_str())
    .bind(escape_like(q))
    .fetch_all(db)
    .await?;
    Ok(products)
}

pub async fn featured(db: &PgPool) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        WHERE featured
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(products)
}

pub async fn reported(db: &PgPool) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        WHERE reported
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(products)
}

pub async fn trending(db: &PgPool, limit: i64) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        ORDER BY upvotes DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(products)
}

pub async fn list_by_owner(db: &PgPool, owner_email: &str) -> Result<Vec<Product>, ApiError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, owner_email, name, image, description, tags, external_link,
               status, featured, reported, upvotes, voters, created_at
        FROM products
        WHERE owner_email = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_email)
    .fetch_all(db)
    .await?;
    Ok(products)
}

/// Escapes LIKE wildcards so the query stays a literal substring match.
fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            ProductStatus::Pending,
            ProductStatus::Accepted,
            ProductStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ProductStatus>().unwrap(), status);
        }
    }

    #[test]
    fn illegal_status_is_invalid_state() {
        let err = "published".parse::<ProductStatus>().unwrap_err();
        assert!(err.to_string().contains("unknown product status"));
        assert_eq!(
            err.status(),
            axum::http::StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn flag_columns_are_fixed() {
        assert_eq!(ProductFlag::Featured.column(), "featured");
        assert_eq!(ProductFlag::Reported.column(), "reported");
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn patch_cannot_express_protected_fields() {
        // A payload smuggling status/owner/tally fields deserializes to the
        // editable columns only.
        let patch: ProductPatch = serde_json::from_str(
            r#"{
                "name": "Widget",
                "tags": ["tools"],
                "status": "accepted",
                "owner_email": "evil@x.com",
                "upvotes": 9999
            }"#,
        )
        .expect("parse");
        assert_eq!(patch.name, "Widget");
        assert_eq!(patch.tags, vec!["tools"]);
    }
}
