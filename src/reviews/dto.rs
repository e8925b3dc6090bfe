use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub reviewer_email: String,
    pub reviewer_name: Option<String>,
    pub reviewer_image: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
}
