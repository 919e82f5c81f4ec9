//! Cart State
//!
//! Pure transitions. `reduce` never touches `self`; it builds the next
//! state, so anything holding the previous state keeps a consistent view.

use serde::{Deserialize, Serialize};

use checkout_core::{calc_amount, format_amount, CartError, CartLineItem, CheckoutPhase};

/// Everything the shopper's session knows about the cart
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Line items in insertion order, one per product
    pub items: Vec<CartLineItem>,

    /// Cart drawer visibility
    pub is_panel_open: bool,

    /// Intent from the last checkout sync
    #[serde(default)]
    pub current_intent_id: Option<String>,

    pub checkout_phase: CheckoutPhase,
}

/// A cart transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    Toggle,
    Add(CartLineItem),
    /// Remove one unit of a product
    Remove(String),
    Clear,
    SetIntentId(Option<String>),
    SetPhase(CheckoutPhase),
}

impl CartState {
    /// Compute the state after `action`
    #[must_use]
    pub fn reduce(&self, action: &CartAction) -> Self {
        match action {
            CartAction::Toggle => Self {
                is_panel_open: !self.is_panel_open,
                ..self.clone()
            },
            CartAction::Add(item) => Self {
                items: add_item(&self.items, item),
                ..self.clone()
            },
            CartAction::Remove(product_id) => Self {
                items: remove_item(&self.items, product_id),
                ..self.clone()
            },
            CartAction::Clear => Self {
                items: Vec::new(),
                ..self.clone()
            },
            CartAction::SetIntentId(id) => Self {
                current_intent_id: id.clone(),
                ..self.clone()
            },
            CartAction::SetPhase(phase) => Self {
                checkout_phase: *phase,
                ..self.clone()
            },
        }
    }

    /// Units of one product in the cart
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Units across the whole cart
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Display subtotal; the server recomputes the real charge
    pub fn subtotal(&self) -> Result<i64, CartError> {
        calc_amount(&self.items)
    }

    /// Formatted subtotal, `None` while an unpriced item is in the cart
    pub fn subtotal_display(&self, currency: &str) -> Option<String> {
        self.subtotal().ok().map(|amount| format_amount(amount, currency))
    }
}

fn add_item(items: &[CartLineItem], item: &CartLineItem) -> Vec<CartLineItem> {
    if items.iter().any(|i| i.product_id == item.product_id) {
        items
            .iter()
            .map(|i| {
                if i.product_id == item.product_id {
                    CartLineItem {
                        quantity: i.quantity.saturating_add(1),
                        ..i.clone()
                    }
                } else {
                    i.clone()
                }
            })
            .collect()
    } else {
        let mut next = items.to_vec();
        next.push(CartLineItem {
            quantity: 1,
            ..item.clone()
        });
        next
    }
}

fn remove_item(items: &[CartLineItem], product_id: &str) -> Vec<CartLineItem> {
    items
        .iter()
        .filter_map(|i| {
            if i.product_id != product_id {
                Some(i.clone())
            } else if i.quantity > 1 {
                Some(CartLineItem {
                    quantity: i.quantity - 1,
                    ..i.clone()
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mug() -> CartLineItem {
        CartLineItem::new("p1", "Mug", Some(500))
    }

    fn tee() -> CartLineItem {
        CartLineItem::new("p2", "Tee", Some(1200))
    }

    fn apply(state: CartState, actions: &[CartAction]) -> CartState {
        actions.iter().fold(state, |s, a| s.reduce(a))
    }

    #[test]
    fn test_add_merges_and_preserves_order() {
        let state = apply(
            CartState::default(),
            &[
                CartAction::Add(mug()),
                CartAction::Add(tee()),
                CartAction::Add(mug()),
            ],
        );

        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].product_id, "p1");
        assert_eq!(state.items[0].quantity, 2);
        assert_eq!(state.items[1].product_id, "p2");
        assert_eq!(state.subtotal(), Ok(2200));
    }

    #[test]
    fn test_add_ignores_incoming_quantity() {
        let state = CartState::default().reduce(&CartAction::Add(mug().with_quantity(7)));
        assert_eq!(state.quantity_of("p1"), 1);
    }

    #[test]
    fn test_add_saturates() {
        let state = CartState {
            items: vec![mug().with_quantity(u32::MAX)],
            ..CartState::default()
        };
        assert_eq!(state.reduce(&CartAction::Add(mug())).quantity_of("p1"), u32::MAX);
    }

    #[test]
    fn test_remove_decrements_then_deletes() {
        let state = apply(
            CartState::default(),
            &[CartAction::Add(mug()), CartAction::Add(mug()), CartAction::Add(tee())],
        );

        let once = state.reduce(&CartAction::Remove("p1".into()));
        assert_eq!(once.quantity_of("p1"), 1);

        let twice = once.reduce(&CartAction::Remove("p1".into()));
        assert_eq!(twice.items.len(), 1);
        assert_eq!(twice.items[0].product_id, "p2");

        let absent = twice.reduce(&CartAction::Remove("p1".into()));
        assert_eq!(absent, twice);
    }

    #[test]
    fn test_quantity_is_adds_minus_removes_clamped() {
        // Deterministic pseudo-random add/remove sequences over three products
        let products = ["p1", "p2", "p3"];
        let mut seed: u64 = 0x5eed;
        for _ in 0..50 {
            let mut state = CartState::default();
            let mut expected = [0i64; 3];
            for _ in 0..40 {
                seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let which = usize::try_from((seed >> 33) % 3).unwrap();
                let id = products[which];
                if (seed >> 20) & 1 == 0 {
                    state = state.reduce(&CartAction::Add(CartLineItem::new(id, id, Some(100))));
                    expected[which] += 1;
                } else {
                    state = state.reduce(&CartAction::Remove(id.to_string()));
                    expected[which] = (expected[which] - 1).max(0);
                }
            }
            for (which, id) in products.iter().enumerate() {
                assert_eq!(i64::from(state.quantity_of(id)), expected[which]);
                let present = state.items.iter().any(|i| i.product_id == *id);
                assert_eq!(present, expected[which] > 0);
            }
        }
    }

    #[test]
    fn test_field_setters() {
        let state = apply(
            CartState::default(),
            &[
                CartAction::Toggle,
                CartAction::Add(mug()),
                CartAction::SetIntentId(Some("pi_1".into())),
                CartAction::SetPhase(CheckoutPhase::Checkout),
                CartAction::Clear,
            ],
        );

        assert!(state.is_panel_open);
        assert!(state.is_empty());
        assert_eq!(state.current_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(state.checkout_phase, CheckoutPhase::Checkout);
        assert!(!state.reduce(&CartAction::Toggle).is_panel_open);
    }

    #[test]
    fn test_reduce_leaves_previous_state_untouched() {
        let before = CartState::default().reduce(&CartAction::Add(mug()));
        let snapshot = before.clone();
        let _after = before.reduce(&CartAction::Add(mug()));
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_subtotal_display() {
        let state = CartState::default()
            .reduce(&CartAction::Add(mug()))
            .reduce(&CartAction::Add(tee()))
            .reduce(&CartAction::Add(mug()));
        assert_eq!(state.subtotal_display("usd").as_deref(), Some("$22.00"));

        let unpriced = state.reduce(&CartAction::Add(CartLineItem::new("p3", "Sample", None)));
        assert_eq!(unpriced.subtotal_display("usd"), None);
    }
}
