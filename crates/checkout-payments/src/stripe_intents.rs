//! Stripe Payment Intents
//!
//! Implements [`PaymentProcessor`] on top of the Payment Intents API. The
//! client confirms the intent with its `client_secret` (Stripe Elements);
//! the server only creates, reads and re-prices intents.

use std::collections::HashMap;

use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods, Currency,
    PaymentIntent as StripeIntent, PaymentIntentId, PaymentIntentStatus, StripeError,
    UpdatePaymentIntent,
};

use crate::error::{PaymentError, Result};
use crate::processor::{CreateIntent, IntentStatus, PaymentIntent, PaymentProcessor};

/// Stripe client wrapper
pub struct StripeProcessor {
    client: Client,
    webhook_secret: String,
}

impl StripeProcessor {
    /// Create a new Stripe processor
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        Ok(Self::new(&secret_key, &webhook_secret))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, request: CreateIntent) -> Result<PaymentIntent> {
        let mut params = CreatePaymentIntent::new(request.amount, parse_currency(&request.currency)?);
        params.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            allow_redirects: None,
            enabled: true,
        });

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), request.user_id.to_string());
        params.metadata = Some(metadata);

        let intent = StripeIntent::create(&self.client, params)
            .await
            .map_err(map_stripe_error)?;

        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            "Created Stripe payment intent"
        );

        Ok(convert(intent))
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<Option<PaymentIntent>> {
        // Not even shaped like an intent id: nothing to find
        let Ok(id) = intent_id.parse::<PaymentIntentId>() else {
            return Ok(None);
        };

        match StripeIntent::retrieve(&self.client, &id, &[]).await {
            Ok(intent) => Ok(Some(convert(intent))),
            Err(StripeError::Stripe(req)) if req.http_status == 404 => Ok(None),
            Err(e) => Err(map_stripe_error(e)),
        }
    }

    async fn update_amount(&self, intent_id: &str, amount: i64) -> Result<PaymentIntent> {
        let id = intent_id
            .parse::<PaymentIntentId>()
            .map_err(|_| PaymentError::IntentNotFound(intent_id.to_string()))?;

        let mut params = UpdatePaymentIntent::new();
        params.amount = Some(amount);

        match StripeIntent::update(&self.client, &id, params).await {
            Ok(intent) => Ok(convert(intent)),
            Err(StripeError::Stripe(req)) if req.http_status == 404 => {
                Err(PaymentError::IntentNotFound(intent_id.to_string()))
            }
            Err(e) => Err(map_stripe_error(e)),
        }
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

/// Currency codes round-trip through Stripe's own lowercase serde names
fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_ascii_lowercase()))
        .map_err(|_| PaymentError::Config(format!("Unsupported currency: {code}")))
}

fn convert(intent: StripeIntent) -> PaymentIntent {
    PaymentIntent {
        id: intent.id.to_string(),
        amount: intent.amount,
        currency: intent.currency.to_string(),
        status: convert_status(intent.status),
        client_secret: intent.client_secret,
    }
}

fn convert_status(status: PaymentIntentStatus) -> IntentStatus {
    match status {
        PaymentIntentStatus::RequiresPaymentMethod => IntentStatus::RequiresPaymentMethod,
        PaymentIntentStatus::RequiresConfirmation => IntentStatus::RequiresConfirmation,
        PaymentIntentStatus::RequiresAction => IntentStatus::RequiresAction,
        PaymentIntentStatus::Processing => IntentStatus::Processing,
        PaymentIntentStatus::RequiresCapture => IntentStatus::RequiresCapture,
        PaymentIntentStatus::Canceled => IntentStatus::Canceled,
        PaymentIntentStatus::Succeeded => IntentStatus::Succeeded,
    }
}

fn map_stripe_error(err: StripeError) -> PaymentError {
    match err {
        StripeError::Stripe(req) if req.http_status >= 500 || req.http_status == 429 => {
            PaymentError::ProcessorUnavailable(format!("Stripe returned {}", req.http_status))
        }
        StripeError::Timeout => PaymentError::ProcessorUnavailable("Stripe request timed out".into()),
        StripeError::ClientError(msg) => PaymentError::ProcessorUnavailable(msg),
        other => PaymentError::Processor(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!(parse_currency("USD").unwrap(), Currency::USD);
        assert_eq!(parse_currency("eur").unwrap(), Currency::EUR);
        assert!(parse_currency("zzz").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(convert_status(PaymentIntentStatus::Canceled).is_canceled());
        assert!(convert_status(PaymentIntentStatus::Succeeded).is_succeeded());
        assert_eq!(
            convert_status(PaymentIntentStatus::RequiresPaymentMethod),
            IntentStatus::RequiresPaymentMethod
        );
    }

    #[tokio::test]
    async fn test_malformed_intent_id_is_not_found() {
        let processor = StripeProcessor::new("sk_test_xxx", "whsec_xxx");
        assert_eq!(processor.retrieve_intent("not-an-intent").await.unwrap(), None);
    }
}
