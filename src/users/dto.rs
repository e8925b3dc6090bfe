use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
}

/// Request body for a role change.
#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub role: String,
}

/// Request body recording a completed subscription payment.
#[derive(Debug, Deserialize)]
pub struct VerifySubscriptionRequest {
    pub amount: f64,
    pub transaction_ref: String,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_name_is_optional() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@x.com"}"#).expect("parse");
        assert_eq!(req.email, "a@x.com");
        assert!(req.name.is_none());
    }

    #[test]
    fn role_response_serializes_flat() {
        let json = serde_json::to_string(&RoleResponse {
            role: "moderator".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"moderator"}"#);
    }
}
