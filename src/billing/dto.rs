use serde::{Deserialize, Serialize};

/// Price in major units (e.g. dollars); converted to integer minor units
/// before it reaches the gateway.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}
