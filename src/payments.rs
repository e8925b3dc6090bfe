use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

/// Payment gateway seam. The backend only ever asks for a card authorization
/// and hands the client secret back to the caller; completion is recorded
/// later through the subscription endpoint.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    client_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl PaymentClient for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> anyhow::Result<String> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];
        let intent: PaymentIntent = self
            .http
            .post("https://api.stripe.com/v1/payment_intents")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .context("stripe create_payment_intent")?
            .error_for_status()
            .context("stripe rejected payment intent")?
            .json()
            .await
            .context("stripe payment intent response")?;
        Ok(intent.client_secret)
    }
}
