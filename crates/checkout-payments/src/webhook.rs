//! Stripe Webhook Handling
//!
//! Moves orders from `pending` to `complete` when the processor reports a
//! successful charge. Delivery is at-least-once and unordered, so the
//! transition is a set-based assignment: replaying an event is harmless.
//!
//! Once a payload is verified it is always acknowledged, including events
//! we ignore and intents we have no order for; the processor would
//! otherwise keep redelivering them.

use std::sync::Arc;

use stripe::{Event, EventObject, EventType, Webhook};

use checkout_core::OrderId;

use crate::error::{PaymentError, Result};
use crate::locks::IntentLocks;
use crate::store::{CompleteOutcome, OrderStore};
use crate::timeout::Timeouts;

/// What a "charge succeeded" event did to the order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed(OrderId),
    AlreadyComplete(OrderId),
    /// No order references the intent (logged, acknowledged)
    UnknownIntent,
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Charge succeeded - complete the order
    ChargeSucceeded {
        event_id: String,
        payment_intent_id: String,
        outcome: CompletionOutcome,
    },

    /// Payment failed - the order stays pending, the shopper may retry
    PaymentFailed {
        event_id: String,
        payment_intent_id: String,
        reason: Option<String>,
    },

    /// Unhandled event type
    Other { event_id: String, event_type: String },
}

/// The event after verification, before it touches the store
#[derive(Debug, PartialEq, Eq)]
enum Verified {
    Succeeded { event_id: String, payment_intent_id: String },
    Failed { event_id: String, payment_intent_id: String, reason: Option<String> },
    Ignored { event_id: String, event_type: String },
}

/// Webhook handler
pub struct WebhookHandler {
    webhook_secret: String,
    store: Arc<dyn OrderStore>,
    locks: Arc<IntentLocks>,
    timeouts: Timeouts,
}

impl WebhookHandler {
    pub fn new(
        webhook_secret: impl Into<String>,
        store: Arc<dyn OrderStore>,
        locks: Arc<IntentLocks>,
    ) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            store,
            locks,
            timeouts: Timeouts::default(),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Verify and process a raw webhook delivery
    ///
    /// Fails with `InvalidSignature` before any state change, or with
    /// `StoreUnavailable` when the order store cannot be reached so the
    /// processor redelivers later.
    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        let event = self.verify(payload, signature)?;

        match classify(event) {
            Verified::Succeeded {
                event_id,
                payment_intent_id,
            } => {
                tracing::info!(
                    event_id = %event_id,
                    payment_intent_id = %payment_intent_id,
                    "Processing charge succeeded webhook"
                );
                let outcome = self.complete(&payment_intent_id).await?;
                Ok(WebhookEvent::ChargeSucceeded {
                    event_id,
                    payment_intent_id,
                    outcome,
                })
            }

            Verified::Failed {
                event_id,
                payment_intent_id,
                reason,
            } => {
                tracing::warn!(
                    event_id = %event_id,
                    payment_intent_id = %payment_intent_id,
                    reason = ?reason,
                    "Payment failed - order stays pending"
                );
                Ok(WebhookEvent::PaymentFailed {
                    event_id,
                    payment_intent_id,
                    reason,
                })
            }

            Verified::Ignored {
                event_id,
                event_type,
            } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Unhandled webhook event");
                Ok(WebhookEvent::Other {
                    event_id,
                    event_type,
                })
            }
        }
    }

    fn verify(&self, payload: &[u8], signature: &str) -> Result<Event> {
        let verified = std::str::from_utf8(payload)
            .map_err(|e| PaymentError::InvalidSignature(format!("payload is not UTF-8: {e}")))
            .and_then(|payload| {
                Webhook::construct_event(payload, signature, &self.webhook_secret)
                    .map_err(|e| PaymentError::InvalidSignature(e.to_string()))
            });

        if let Err(e) = &verified {
            tracing::warn!(error = %e, "Webhook signature failed");
        }
        verified
    }

    async fn complete(&self, payment_intent_id: &str) -> Result<CompletionOutcome> {
        let _guard = self.locks.lock(payment_intent_id).await;

        let outcome = self
            .timeouts
            .store("mark_complete", self.store.mark_complete(payment_intent_id))
            .await?;

        Ok(match outcome {
            CompleteOutcome::Completed(order) => {
                tracing::info!(
                    order_id = %order.id,
                    payment_intent_id = %payment_intent_id,
                    amount = order.amount,
                    "Order complete"
                );
                CompletionOutcome::Completed(order.id)
            }
            CompleteOutcome::AlreadyComplete(order) => {
                tracing::debug!(
                    order_id = %order.id,
                    payment_intent_id = %payment_intent_id,
                    "Duplicate delivery, order already complete"
                );
                CompletionOutcome::AlreadyComplete(order.id)
            }
            CompleteOutcome::NotFound => {
                tracing::warn!(
                    payment_intent_id = %payment_intent_id,
                    "Charge succeeded for an intent with no order"
                );
                CompletionOutcome::UnknownIntent
            }
        })
    }
}

/// Sort a verified event into the cases we act on
fn classify(event: Event) -> Verified {
    let event_id = event.id.to_string();

    match (event.type_, event.data.object) {
        (EventType::ChargeSucceeded, EventObject::Charge(charge)) => match charge.payment_intent {
            Some(intent) => Verified::Succeeded {
                event_id,
                payment_intent_id: intent.id().to_string(),
            },
            // Charges created outside a payment intent have no order
            None => Verified::Ignored {
                event_id,
                event_type: EventType::ChargeSucceeded.to_string(),
            },
        },

        (EventType::PaymentIntentSucceeded, EventObject::PaymentIntent(intent)) => {
            Verified::Succeeded {
                event_id,
                payment_intent_id: intent.id.to_string(),
            }
        }

        (EventType::ChargeFailed, EventObject::Charge(charge)) => match charge.payment_intent {
            Some(intent) => Verified::Failed {
                event_id,
                payment_intent_id: intent.id().to_string(),
                reason: charge.failure_message,
            },
            None => Verified::Ignored {
                event_id,
                event_type: EventType::ChargeFailed.to_string(),
            },
        },

        (EventType::PaymentIntentPaymentFailed, EventObject::PaymentIntent(intent)) => {
            Verified::Failed {
                event_id,
                payment_intent_id: intent.id.to_string(),
                reason: intent.last_payment_error.and_then(|error| error.message),
            }
        }

        (event_type, _) => Verified::Ignored {
            event_id,
            event_type: event_type.to_string(),
        },
    }
}
