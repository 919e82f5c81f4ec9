//! checkout-client
//!
//! Shopper-side half of checkout: the cart store that survives reloads and
//! the API client that turns a cart into a payment intent.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_client::{CartStore, CheckoutClient, FileCartStorage};
//!
//! let cart = CartStore::open(Arc::new(FileCartStorage::new(data_dir)));
//! cart.add(CartLineItem::new("p1", "Mug", Some(500)));
//!
//! let client = CheckoutClient::new("http://localhost:3000")?.with_token(token);
//! let session = client.sync_checkout(&cart).await?;
//! // session.payment_intent.client_secret goes to the payment form
//! ```

mod api;
mod error;
mod state;
mod storage;
mod store;

pub use api::{CheckoutClient, CheckoutSession, IntentView};
pub use error::{ClientError, Result};
pub use state::{CartAction, CartState};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, CART_STORE_KEY};
pub use store::CartStore;
