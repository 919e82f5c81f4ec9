//! Orders
//!
//! The persisted record a payment intent is reconciled against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::CartLineItem;
use crate::error::CartError;

/// Authenticated user identifier (owner reference on orders)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique order identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order lifecycle. Only moves `Pending -> Complete`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Complete,
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Complete => "complete",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchased line, frozen from the cart snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price per unit in minor currency units
    pub unit_amount: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    pub quantity: u32,
}

impl OrderLineItem {
    /// Freeze a cart line; an unpriced line cannot become part of an order.
    pub fn from_cart(item: &CartLineItem) -> Result<Self, CartError> {
        let unit_amount = item
            .unit_amount
            .ok_or_else(|| CartError::MissingUnitAmount(item.product_id.clone()))?;

        Ok(Self {
            name: item.name.clone(),
            description: None,
            unit_amount,
            image_ref: item.image_ref.clone(),
            quantity: item.quantity,
        })
    }

    /// Freeze a whole cart snapshot
    pub fn from_cart_items(items: &[CartLineItem]) -> Result<Vec<Self>, CartError> {
        items.iter().map(Self::from_cart).collect()
    }
}

/// A persisted order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Owner
    pub user_id: UserId,

    /// Charge amount in minor currency units
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,

    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Unique across orders
    pub payment_intent_id: Option<String>,

    pub line_items: Vec<OrderLineItem>,

    /// Bumped on every write
    pub version: u64,
}

impl Order {
    /// Create a pending order for a freshly created intent
    pub fn new_pending(
        user_id: UserId,
        amount: i64,
        currency: impl Into<String>,
        payment_intent_id: impl Into<String>,
        line_items: Vec<OrderLineItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            amount,
            currency: currency.into(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            payment_intent_id: Some(payment_intent_id.into()),
            line_items,
            version: 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == OrderStatus::Complete
    }

    /// Swap in a new cart snapshot, keeping identity, owner, status and intent.
    ///
    /// Returns `false` (and writes nothing) when the snapshot is unchanged.
    pub fn replace_line_items(&mut self, line_items: Vec<OrderLineItem>, amount: i64) -> bool {
        if self.line_items == line_items && self.amount == amount {
            return false;
        }
        self.line_items = line_items;
        self.amount = amount;
        self.touch();
        true
    }

    /// Set the status to `Complete`. Returns `false` when it already was.
    pub fn mark_complete(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.status = OrderStatus::Complete;
        self.touch();
        true
    }

    /// Total units across all lines
    pub fn item_count(&self) -> u64 {
        self.line_items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        let lines = OrderLineItem::from_cart_items(&[
            CartLineItem::new("p1", "Mug", Some(500)).with_quantity(2),
        ])
        .unwrap();
        Order::new_pending(UserId::new("u1"), 1000, "usd", "pi_1", lines)
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.version, 1);
    }

    #[test]
    fn test_replace_preserves_identity() {
        let mut order = order();
        let id = order.id;
        let lines = OrderLineItem::from_cart_items(&[CartLineItem::new("p2", "Tee", Some(1200))]).unwrap();

        assert!(order.replace_line_items(lines.clone(), 1200));
        assert!(!order.replace_line_items(lines, 1200));

        assert_eq!(order.id, id);
        assert_eq!(order.user_id, UserId::new("u1"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(order.amount, 1200);
        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.version, 2);
    }

    #[test]
    fn test_mark_complete_is_set_based() {
        let mut order = order();
        assert!(order.mark_complete());
        assert!(!order.mark_complete());
        assert!(order.is_complete());
        assert_eq!(order.version, 2);
    }

    #[test]
    fn test_unpriced_cart_line_cannot_be_ordered() {
        let err = OrderLineItem::from_cart(&CartLineItem::new("p9", "Sample", None)).unwrap_err();
        assert_eq!(err, CartError::MissingUnitAmount("p9".into()));
    }
}
