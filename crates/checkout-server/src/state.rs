//! Application State

use std::sync::Arc;

use checkout_core::SessionStore;
use checkout_payments::{
    IntentLocks, IntentReconciler, OrderStore, PaymentProcessor, Timeouts, WebhookHandler,
};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Cart/intent/order reconciliation (None if no processor is configured)
    pub reconciler: Option<Arc<IntentReconciler>>,

    /// Signed webhook consumer (None without a signing secret)
    pub webhooks: Option<Arc<WebhookHandler>>,

    /// Order persistence, read directly by the order endpoints
    pub orders: Arc<dyn OrderStore>,

    /// Bearer-token sessions
    pub sessions: Arc<dyn SessionStore>,

    pub timeouts: Timeouts,

    /// Name of the configured processor, for the health endpoint
    pub processor: Option<String>,
}

impl AppState {
    /// Wire the reconciler and webhook consumer around one store and one lock registry
    pub fn new(
        config: &ServerConfig,
        processor: Option<Arc<dyn PaymentProcessor>>,
        webhook_secret: Option<&str>,
        orders: Arc<dyn OrderStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let locks = Arc::new(IntentLocks::new());

        let processor_name = processor.as_ref().map(|p| p.name().to_string());
        let reconciler = processor.map(|processor| {
            Arc::new(
                IntentReconciler::new(processor, orders.clone(), locks.clone())
                    .with_currency(config.currency.clone())
                    .with_timeouts(config.timeouts),
            )
        });
        let webhooks = webhook_secret.map(|secret| {
            Arc::new(
                WebhookHandler::new(secret, orders.clone(), locks)
                    .with_timeouts(config.timeouts),
            )
        });

        Self {
            reconciler,
            webhooks,
            orders,
            sessions,
            timeouts: config.timeouts,
            processor: processor_name,
        }
    }
}
