//! Cart Line Items
//!
//! The wire shape of a cart entry, shared by the client store and the
//! checkout endpoint.

use serde::{Deserialize, Serialize};

/// A product in the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product identifier (unique within a cart)
    pub product_id: String,

    /// Display name
    pub name: String,

    /// Price per unit in minor currency units; `None` means not for sale
    #[serde(default)]
    pub unit_amount: Option<i64>,

    /// Units in the cart (always >= 1 inside a cart)
    pub quantity: u32,

    /// Product image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CartLineItem {
    /// Create a line item with quantity 1
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_amount: Option<i64>) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_amount,
            quantity: 1,
            image_ref: None,
        }
    }

    /// Set the quantity
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the image reference
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Where the shopper is in the checkout flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutPhase {
    #[default]
    Cart,
    Checkout,
    Success,
}

impl std::fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutPhase::Cart => write!(f, "cart"),
            CheckoutPhase::Checkout => write!(f, "checkout"),
            CheckoutPhase::Success => write!(f, "success"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_wire_format() {
        let item = CartLineItem::new("p1", "Mug", Some(500)).with_quantity(2);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["product_id"], "p1");
        assert_eq!(json["unit_amount"], 500);
        assert!(json.get("image_ref").is_none());

        let parsed: CartLineItem =
            serde_json::from_str(r#"{"product_id":"p2","name":"Tee","quantity":1}"#).unwrap();
        assert_eq!(parsed.unit_amount, None);
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&CheckoutPhase::Success).unwrap(), "\"success\"");
        assert_eq!(CheckoutPhase::default(), CheckoutPhase::Cart);
    }
}
