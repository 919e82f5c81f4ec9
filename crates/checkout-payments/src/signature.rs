//! Webhook Signing
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and sends
//! `Stripe-Signature: t=<unix seconds>,v1=<hex digest>`. Verification is
//! `stripe::Webhook::construct_event` in [`crate::WebhookHandler`]; this
//! side produces the same header for local deliveries and test fixtures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs payloads with the shared webhook secret
#[derive(Clone)]
pub struct WebhookSigner {
    secret: String,
}

impl std::fmt::Debug for WebhookSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSigner").finish_non_exhaustive()
    }
}

impl WebhookSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// `Stripe-Signature` header for `payload` signed at `timestamp` (unix seconds)
    pub fn sign(&self, payload: &str, timestamp: i64) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::Config(format!("invalid webhook secret: {e}")))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());

        Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
    }
}
