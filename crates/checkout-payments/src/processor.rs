//! Payment Processor Abstraction
//!
//! The reconciler only ever talks to the processor through
//! [`PaymentProcessor`]; [`crate::StripeProcessor`] is the production
//! implementation and [`crate::MockProcessor`] backs tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use checkout_core::UserId;

use crate::error::Result;

/// Processor-side intent lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl IntentStatus {
    /// The intent can no longer be charged or edited
    pub fn is_canceled(&self) -> bool {
        matches!(self, IntentStatus::Canceled)
    }

    /// Money has moved; the order must be treated as final
    pub fn is_succeeded(&self) -> bool {
        matches!(self, IntentStatus::Succeeded)
    }
}

/// Our mirror of a processor payment intent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,

    /// Minor currency units
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,

    pub status: IntentStatus,

    /// Handed to the client to confirm the payment
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Parameters for a new intent
#[derive(Clone, Debug)]
pub struct CreateIntent {
    pub amount: i64,
    pub currency: String,

    /// Recorded in processor metadata for support lookups
    pub user_id: UserId,
}

/// Payment processor trait (Strategy pattern)
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a new intent for the given amount
    async fn create_intent(&self, request: CreateIntent) -> Result<PaymentIntent>;

    /// Fetch an intent; `None` when the processor does not know the id
    async fn retrieve_intent(&self, intent_id: &str) -> Result<Option<PaymentIntent>>;

    /// Change the amount of an existing intent
    async fn update_amount(&self, intent_id: &str, amount: i64) -> Result<PaymentIntent>;

    /// Processor name
    fn name(&self) -> &str;
}
