use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

/// Roles only ever escalate; `promote` refuses any change that does not
/// move up this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(ApiError::InvalidState(format!("unknown role: {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Unverified,
    Verified,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Unverified => "unverified",
            SubscriptionStatus::Verified => "verified",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub subscription_status: String,
    pub subscription_amount: Option<f64>,
    pub transaction_ref: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Idempotent registration: inserting an existing email is a no-op and the
/// stored record is returned untouched. The bool reports whether a row was
/// actually created.
pub async fn register(
    db: &PgPool,
    email: &str,
    name: Option<&str>,
) -> Result<(User, bool), ApiError> {
    let inserted = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
        RETURNING email, name, role, subscription_status, subscription_amount,
                  transaction_ref, created_at
        "#,
    )
    .bind(email)
    .bind(name)
    .fetch_optional(db)
    .await?;

    match inserted {
        Some(user) => Ok((user, true)),
        None => {
            let user = find_by_email(db, email)
                .await?
                .ok_or(ApiError::NotFound("user"))?;
            Ok((user, false))
        }
    }
}

pub async fn list(db: &PgPool) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT email, name, role, subscription_status, subscription_amount,
               transaction_ref, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT email, name, role, subscription_status, subscription_amount,
               transaction_ref, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn role(db: &PgPool, email: &str) -> Result<String, ApiError> {
    let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(role)
}

/// Conditional escalation: the update only fires when the target role
/// outranks the stored one, so a stale or malicious request can never demote.
pub async fn promote(db: &PgPool, email: &str, role: Role) -> Result<User, ApiError> {
    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET role = $2
        WHERE email = $1
          AND array_position(ARRAY['user','moderator','admin'], role)
            < array_position(ARRAY['user','moderator','admin'], $2)
        RETURNING email, name, role, subscription_status, subscription_amount,
                  transaction_ref, created_at
        "#,
    )
    .bind(email)
    .bind(role.as_str())
    .fetch_optional(db)
    .await?;

    match updated {
        Some(user) => Ok(user),
        None => match find_by_email(db, email).await? {
            None => Err(ApiError::NotFound("user")),
            Some(existing) => Err(ApiError::Conflict(format!(
                "cannot change role from {} to {}",
                existing.role, role
            ))),
        },
    }
}

/// Durable record of a completed payment. Idempotent: re-verifying simply
/// overwrites the amount and transaction reference again.
pub async fn verify_subscription(
    db: &PgPool,
    email: &str,
    amount: f64,
    transaction_ref: &str,
) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET subscription_status = $2, subscription_amount = $3, transaction_ref = $4
        WHERE email = $1
        RETURNING email, name, role, subscription_status, subscription_amount,
                  transaction_ref, created_at
        "#,
    )
    .bind(email)
    .bind(SubscriptionStatus::Verified.as_str())
    .bind(amount)
    .bind(transaction_ref)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("user"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_roundtrip() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_invalid_state() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("unknown role"));
    }

    #[test]
    fn subscription_status_strings_match_schema_defaults() {
        assert_eq!(SubscriptionStatus::Unverified.as_str(), "unverified");
        assert_eq!(SubscriptionStatus::Verified.as_str(), "verified");
    }
}
