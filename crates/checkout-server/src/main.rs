//! Checkout HTTP Server
//!
//! Serves the checkout, webhook and order endpoints over axum.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::MemorySessionStore;
use checkout_payments::{MemoryOrderStore, MockProcessor, PaymentProcessor, StripeProcessor};
use checkout_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // Initialize payments
    let (processor, webhook_secret): (Option<Arc<dyn PaymentProcessor>>, Option<String>) =
        match StripeProcessor::from_env() {
            Ok(stripe) => {
                tracing::info!("✓ Stripe configured");
                let secret = stripe.webhook_secret().to_string();
                (Some(Arc::new(stripe) as Arc<dyn PaymentProcessor>), Some(secret))
            }
            Err(e) if config.mock_processor => {
                tracing::warn!("⚠ {e} - using the in-process mock processor");
                (
                    Some(Arc::new(MockProcessor::new()) as Arc<dyn PaymentProcessor>),
                    config.webhook_secret.clone(),
                )
            }
            Err(e) => {
                tracing::warn!("⚠ {e} - payments disabled");
                tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
                (None, None)
            }
        };

    let sessions = Arc::new(MemorySessionStore::with_tokens(config.session_tokens.clone()));
    if sessions.is_empty() {
        tracing::warn!("⚠ No sessions configured - every checkout will be rejected");
        tracing::warn!("  Set SESSION_TOKENS=token=user,... in .env");
    }

    // Build application state
    let state = AppState::new(
        &config,
        processor,
        webhook_secret.as_deref(),
        Arc::new(MemoryOrderStore::new()),
        sessions,
    );
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 checkout server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!(currency = %config.currency, "Endpoints:");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  POST /api/checkout     - Reconcile cart with payment intent");
    tracing::info!("  GET  /api/orders       - Caller's orders");
    tracing::info!("  GET  /api/orders/{{id}}  - One order");
    tracing::info!("  POST /webhook/stripe   - Stripe events");

    axum::serve(listener, app).await?;

    Ok(())
}
