//! # checkout-payments
//!
//! Server-side half of the storefront checkout: keeps payment intents,
//! orders and carts consistent.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  items + intent id  ┌──────────────────┐  create / update  ┌──────────┐
//! │   Client    │────────────────────▶│ IntentReconciler │──────────────────▶│  Stripe  │
//! │   cart      │◀────────────────────│                  │                   │          │
//! └─────────────┘  intent + order     └──────────────────┘                   └──────────┘
//!                                              │ pending order                    │
//!                                              ▼                                  │ charge.succeeded
//!                                     ┌──────────────────┐   mark complete  ┌─────▼──────────┐
//!                                     │   OrderStore     │◀─────────────────│ WebhookHandler │
//!                                     └──────────────────┘                  └────────────────┘
//! ```
//!
//! Both writers serialize per payment intent through [`IntentLocks`], and
//! every processor/store call runs under a [`Timeouts`] deadline.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_payments::{
//!     IntentLocks, IntentReconciler, MemoryOrderStore, ReconcileRequest, StripeProcessor,
//! };
//!
//! let processor = Arc::new(StripeProcessor::new("sk_test_xxx", "whsec_xxx"));
//! let store = Arc::new(MemoryOrderStore::new());
//! let reconciler = IntentReconciler::new(processor, store, Arc::new(IntentLocks::new()));
//!
//! let result = reconciler.reconcile(Some(&user_id), ReconcileRequest {
//!     items: cart.items.clone(),
//!     payment_intent_id: cart.current_intent_id.clone(),
//! }).await?;
//!
//! // Hand result.payment_intent.client_secret to the payment form
//! ```

mod error;
mod locks;
mod mock;
mod processor;
mod reconcile;
mod signature;
mod store;
mod stripe_intents;
mod timeout;
mod webhook;

pub use error::{PaymentError, Result};
pub use locks::IntentLocks;
pub use mock::MockProcessor;
pub use processor::{CreateIntent, IntentStatus, PaymentIntent, PaymentProcessor};
pub use reconcile::{IntentReconciler, ReconcileRequest, Reconciliation};
pub use signature::WebhookSigner;
pub use store::{CompleteOutcome, MemoryOrderStore, OrderStore, ReplaceOutcome};
pub use stripe_intents::StripeProcessor;
pub use timeout::Timeouts;
pub use webhook::{CompletionOutcome, WebhookEvent, WebhookHandler};
