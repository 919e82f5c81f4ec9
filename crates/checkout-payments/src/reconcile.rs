//! Intent Reconciliation
//!
//! Keeps the processor's payment intent and the persisted order in step
//! with the shopper's cart:
//!
//! ```text
//! no intent id ──▶ create intent(amount) ──▶ insert pending order ──▶ {intent, order}
//!
//! intent id ──▶ lock(intent) ──▶ retrieve intent ──▶ find order ──▶ amount differs?
//!                                   │ gone/canceled      │ missing       │ yes: update intent
//!                                   ▼                    ▼               ▼
//!                            IntentNotFound        OrderNotFound   replace line items
//! ```
//!
//! The charge amount is always recomputed here from the submitted lines.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use checkout_core::{validate_chargeable, CartLineItem, Order, OrderLineItem, UserId};

use crate::error::{PaymentError, Result};
use crate::locks::IntentLocks;
use crate::processor::{CreateIntent, PaymentIntent, PaymentProcessor};
use crate::store::{OrderStore, ReplaceOutcome};
use crate::timeout::Timeouts;

/// Cart snapshot submitted by the client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub items: Vec<CartLineItem>,

    /// Intent from an earlier checkout attempt, if any
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// The intent and order after reconciliation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reconciliation {
    pub payment_intent: PaymentIntent,
    pub order: Order,

    /// A new intent/order pair was created
    pub created: bool,
}

/// Server-side reconciler between carts, intents and orders
pub struct IntentReconciler {
    processor: Arc<dyn PaymentProcessor>,
    store: Arc<dyn OrderStore>,
    locks: Arc<IntentLocks>,
    currency: String,
    timeouts: Timeouts,
}

impl IntentReconciler {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        store: Arc<dyn OrderStore>,
        locks: Arc<IntentLocks>,
    ) -> Self {
        Self {
            processor,
            store,
            locks,
            currency: "usd".into(),
            timeouts: Timeouts::default(),
        }
    }

    /// Charge currency (lowercase ISO code)
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_ascii_lowercase();
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Create or update the intent/order pair for a cart snapshot
    pub async fn reconcile(
        &self,
        caller: Option<&UserId>,
        request: ReconcileRequest,
    ) -> Result<Reconciliation> {
        let user = caller.ok_or(PaymentError::Unauthorized)?;

        let amount = validate_chargeable(&request.items)?;
        let line_items = OrderLineItem::from_cart_items(&request.items)?;

        match request.payment_intent_id.as_deref().filter(|id| !id.is_empty()) {
            None => self.create(user, amount, line_items).await,
            Some(intent_id) => self.update(user, intent_id, amount, line_items).await,
        }
    }

    async fn create(
        &self,
        user: &UserId,
        amount: i64,
        line_items: Vec<OrderLineItem>,
    ) -> Result<Reconciliation> {
        let request = CreateIntent {
            amount,
            currency: self.currency.clone(),
            user_id: user.clone(),
        };
        let intent = self
            .timeouts
            .processor("create_intent", self.processor.create_intent(request))
            .await?;

        let order = Order::new_pending(user.clone(), amount, &self.currency, &intent.id, line_items);
        if let Err(e) = self.timeouts.store("insert_order", self.store.insert(&order)).await {
            // The intent is orphaned; the client restarts checkout without it.
            tracing::error!(
                payment_intent_id = %intent.id,
                error = %e,
                "Created payment intent but could not persist its order"
            );
            return Err(e);
        }

        tracing::info!(
            order_id = %order.id,
            payment_intent_id = %intent.id,
            user_id = %user,
            amount,
            "Created pending order"
        );

        Ok(Reconciliation {
            payment_intent: intent,
            order,
            created: true,
        })
    }

    async fn update(
        &self,
        user: &UserId,
        intent_id: &str,
        amount: i64,
        line_items: Vec<OrderLineItem>,
    ) -> Result<Reconciliation> {
        let _guard = self.locks.lock(intent_id).await;

        let intent = self
            .timeouts
            .processor("retrieve_intent", self.processor.retrieve_intent(intent_id))
            .await?
            .filter(|intent| !intent.status.is_canceled())
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))?;

        let order = match self
            .timeouts
            .store("find_by_intent", self.store.find_by_intent(intent_id))
            .await?
        {
            Some(order) if &order.user_id == user => order,
            Some(order) => {
                tracing::warn!(
                    payment_intent_id = %intent_id,
                    order_id = %order.id,
                    caller = %user,
                    "Caller submitted an intent owned by another user"
                );
                return Err(PaymentError::OrderNotFound(intent_id.to_string()));
            }
            None => {
                tracing::error!(
                    payment_intent_id = %intent_id,
                    "Processor knows the intent but no order references it"
                );
                return Err(PaymentError::OrderNotFound(intent_id.to_string()));
            }
        };

        if order.is_complete() || intent.status.is_succeeded() {
            return Err(PaymentError::OrderFinalized(intent_id.to_string()));
        }

        if order.amount != intent.amount {
            // Left behind by an earlier attempt that failed between the two writes
            tracing::warn!(
                payment_intent_id = %intent_id,
                order_amount = order.amount,
                intent_amount = intent.amount,
                "Order and intent amounts diverged, repairing"
            );
        }

        let intent = if intent.amount == amount {
            intent
        } else {
            self.timeouts
                .processor("update_amount", self.processor.update_amount(intent_id, amount))
                .await?
        };

        let outcome = self
            .timeouts
            .store(
                "replace_line_items",
                self.store.replace_for_intent(intent_id, line_items, amount),
            )
            .await?;

        match outcome {
            ReplaceOutcome::Updated(order) => {
                tracing::info!(
                    order_id = %order.id,
                    payment_intent_id = %intent_id,
                    amount,
                    version = order.version,
                    "Reconciled order with cart"
                );
                Ok(Reconciliation {
                    payment_intent: intent,
                    order,
                    created: false,
                })
            }
            ReplaceOutcome::NotFound => Err(PaymentError::OrderNotFound(intent_id.to_string())),
            ReplaceOutcome::Finalized(_) => Err(PaymentError::OrderFinalized(intent_id.to_string())),
        }
    }
}
