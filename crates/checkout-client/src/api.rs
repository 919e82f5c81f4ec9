//! API Client
//!
//! Talks to the checkout server on behalf of a [`CartStore`]: submits the
//! current cart plus the last known intent id and records what comes back.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use checkout_core::{CartLineItem, Order, OrderId};

use crate::error::{ClientError, Result};
use crate::store::CartStore;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Payment intent as the server reports it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentView {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,

    /// Passed to the payment form to confirm the charge
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Server response to a checkout sync
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub payment_intent: IntentView,
    pub order: Order,
    #[serde(default)]
    pub created: bool,
}

#[derive(Serialize)]
struct CheckoutBody<'a> {
    items: &'a [CartLineItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_intent_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

#[derive(Clone, Debug)]
pub struct CheckoutClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CheckoutClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticate requests with a session token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reconcile the cart with the server and move it into the checkout phase
    ///
    /// A stale intent (canceled or unknown to the server) is dropped and the
    /// sync restarted once without it.
    pub async fn sync_checkout(&self, cart: &CartStore) -> Result<CheckoutSession> {
        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let intent_id = snapshot.current_intent_id.as_deref();
        let session = match self.post_checkout(&snapshot.items, intent_id).await {
            Err(e) if intent_id.is_some() && e.code() == Some("INTENT_NOT_FOUND") => {
                warn!(intent_id = ?intent_id, "Stored intent is stale, starting a fresh checkout");
                cart.set_intent_id(None);
                self.post_checkout(&snapshot.items, None).await?
            }
            other => other?,
        };

        cart.begin_checkout(session.payment_intent.id.clone());

        info!(
            intent_id = %session.payment_intent.id,
            order_id = %session.order.id,
            amount = session.payment_intent.amount,
            created = session.created,
            "Checkout synced"
        );
        Ok(session)
    }

    /// Orders for the signed-in user, newest first
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let request = self.authorized(self.http.get(self.url("/api/orders")));
        Self::decode(request.send().await?).await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        let request = self.authorized(self.http.get(self.url(&format!("/api/orders/{id}"))));
        Self::decode(request.send().await?).await
    }

    async fn post_checkout(
        &self,
        items: &[CartLineItem],
        payment_intent_id: Option<&str>,
    ) -> Result<CheckoutSession> {
        debug!(items = items.len(), intent_id = ?payment_intent_id, "Posting checkout");

        let request = self
            .authorized(self.http.post(self.url("/api/checkout")))
            .json(&CheckoutBody {
                items,
                payment_intent_id,
            });
        Self::decode(request.send().await?).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let (code, message) = match response.json::<ErrorBody>().await {
            Ok(body) => (body.code, body.error),
            Err(_) => ("HTTP_ERROR".to_string(), status.to_string()),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = CheckoutClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/checkout"), "http://localhost:3000/api/checkout");
    }

    #[test]
    fn test_checkout_body_omits_missing_intent() {
        let items = vec![CartLineItem::new("p1", "Mug", Some(500))];
        let body = serde_json::to_value(CheckoutBody {
            items: &items,
            payment_intent_id: None,
        })
        .unwrap();

        assert!(body.get("payment_intent_id").is_none());
        assert_eq!(body["items"][0]["product_id"], "p1");
    }

    #[tokio::test]
    async fn test_empty_cart_is_not_sent() {
        let cart = CartStore::open(std::sync::Arc::new(crate::MemoryCartStorage::new()));
        // Unroutable port; an attempted request would surface as Http, not EmptyCart
        let client = CheckoutClient::new("http://127.0.0.1:9").unwrap();

        let err = client.sync_checkout(&cart).await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyCart));
    }

    #[test]
    fn test_error_codes() {
        let err = ClientError::Api {
            status: 503,
            code: "PROCESSOR_UNAVAILABLE".into(),
            message: "try again".into(),
        };
        assert_eq!(err.code(), Some("PROCESSOR_UNAVAILABLE"));
        assert!(err.is_retryable());
        assert!(!ClientError::EmptyCart.is_retryable());
    }
}
