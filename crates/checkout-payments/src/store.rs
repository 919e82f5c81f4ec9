//! Order Storage
//!
//! The data store is an external collaborator; [`OrderStore`] is the
//! contract the reconciler and webhook consumer rely on. Every operation
//! keyed by a payment intent id is atomic, which is what lets
//! "replace line items" and "mark complete" run concurrently without
//! losing either update.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use checkout_core::{Order, OrderId, OrderLineItem, UserId};

use crate::error::{PaymentError, Result};

/// Result of replacing an order's line items
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Written (or already identical)
    Updated(Order),
    /// No order references the intent
    NotFound,
    /// The order is complete and frozen; nothing was written
    Finalized(Order),
}

/// Result of marking an order complete
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompleteOutcome {
    Completed(Order),
    AlreadyComplete(Order),
    NotFound,
}

/// Order storage trait
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails if another order already uses its intent id.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Get order by id
    async fn get(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Get the order uniquely associated with a payment intent
    async fn find_by_intent(&self, payment_intent_id: &str) -> Result<Option<Order>>;

    /// Atomically replace line items and amount of a pending order
    async fn replace_for_intent(
        &self,
        payment_intent_id: &str,
        line_items: Vec<OrderLineItem>,
        amount: i64,
    ) -> Result<ReplaceOutcome>;

    /// Atomically set the order's status to complete
    async fn mark_complete(&self, payment_intent_id: &str) -> Result<CompleteOutcome>;

    /// All orders owned by a user, newest first
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Delete an order
    async fn delete(&self, id: &OrderId) -> Result<()>;
}

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    by_intent: HashMap<String, OrderId>,
}

/// In-memory order store (for development)
#[derive(Default)]
pub struct MemoryOrderStore {
    tables: RwLock<Tables>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tables = self.tables.write().await;

        if let Some(intent_id) = &order.payment_intent_id {
            if tables.by_intent.contains_key(intent_id) {
                return Err(PaymentError::Storage(format!(
                    "an order already references payment intent {intent_id}"
                )));
            }
            tables.by_intent.insert(intent_id.clone(), order.id);
        }
        tables.orders.insert(order.id, order.clone());

        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(id).cloned())
    }

    async fn find_by_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_intent
            .get(payment_intent_id)
            .and_then(|id| tables.orders.get(id))
            .cloned())
    }

    async fn replace_for_intent(
        &self,
        payment_intent_id: &str,
        line_items: Vec<OrderLineItem>,
        amount: i64,
    ) -> Result<ReplaceOutcome> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.by_intent.get(payment_intent_id).copied() else {
            return Ok(ReplaceOutcome::NotFound);
        };
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(ReplaceOutcome::NotFound);
        };

        if order.is_complete() {
            return Ok(ReplaceOutcome::Finalized(order.clone()));
        }
        order.replace_line_items(line_items, amount);

        Ok(ReplaceOutcome::Updated(order.clone()))
    }

    async fn mark_complete(&self, payment_intent_id: &str) -> Result<CompleteOutcome> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.by_intent.get(payment_intent_id).copied() else {
            return Ok(CompleteOutcome::NotFound);
        };
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(CompleteOutcome::NotFound);
        };

        if order.mark_complete() {
            Ok(CompleteOutcome::Completed(order.clone()))
        } else {
            Ok(CompleteOutcome::AlreadyComplete(order.clone()))
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn delete(&self, id: &OrderId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if let Some(order) = tables.orders.remove(id) {
            if let Some(intent_id) = order.payment_intent_id {
                tables.by_intent.remove(&intent_id);
            }
        }

        Ok(())
    }
}
