use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub owner_email: String,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub external_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default = "default_trending_limit")]
    pub limit: i64,
}

fn default_trending_limit() -> i64 {
    6
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// `?value=false` clears a flag; the flag-setting endpoints default to true.
#[derive(Debug, Deserialize)]
pub struct FlagParams {
    #[serde(default = "default_flag_value")]
    pub value: bool,
}

fn default_flag_value() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub upvotes: i32,
}
