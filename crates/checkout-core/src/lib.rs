//! # checkout-core
//!
//! Shared domain types for the storefront checkout flow.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   cart snapshot   ┌─────────────────┐   amount    ┌──────────────┐
//! │ Cart Store   │──────────────────▶│ Intent          │────────────▶│  Payment     │
//! │ (client)     │◀──────────────────│ Reconciler      │◀────────────│  Processor   │
//! └──────────────┘   intent id       └─────────────────┘             └──────────────┘
//!                                            │ pending order                │ webhook
//!                                            ▼                              ▼
//!                                    ┌─────────────────┐  complete  ┌──────────────┐
//!                                    │  Order Store    │◀───────────│  Webhook     │
//!                                    └─────────────────┘            │  Consumer    │
//!                                                                   └──────────────┘
//! ```
//!
//! Both sides of the wire share [`calc_amount`]: the client for display, the
//! server as the authoritative charge amount. Amounts are `i64` minor currency
//! units throughout.

pub mod amount;
pub mod cart;
pub mod error;
pub mod order;
pub mod session;

pub use amount::{calc_amount, format_amount, validate_chargeable};
pub use cart::{CartLineItem, CheckoutPhase};
pub use error::{CartError, CheckoutCoreError, Result};
pub use order::{Order, OrderId, OrderLineItem, OrderStatus, UserId};
pub use session::{MemorySessionStore, Session, SessionStore, SessionToken};
