//! Order Amount Calculator
//!
//! Integer minor-unit arithmetic only. The same function backs the cart
//! subtotal on the client and the authoritative charge on the server; the
//! server never trusts a client-submitted total.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::cart::CartLineItem;
use crate::error::CartError;

/// Stripe's zero-decimal currencies: the minor unit is the major unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Sum `unit_amount * quantity` over the cart.
///
/// A line item without a unit amount is a fault, never a zero.
pub fn calc_amount(items: &[CartLineItem]) -> Result<i64, CartError> {
    items.iter().try_fold(0i64, |total, item| {
        let unit = item
            .unit_amount
            .ok_or_else(|| CartError::MissingUnitAmount(item.product_id.clone()))?;
        let line = unit
            .checked_mul(i64::from(item.quantity))
            .ok_or(CartError::AmountOverflow)?;
        total.checked_add(line).ok_or(CartError::AmountOverflow)
    })
}

/// Validate a cart snapshot before it is charged and return its total.
pub fn validate_chargeable(items: &[CartLineItem]) -> Result<i64, CartError> {
    if items.is_empty() {
        return Err(CartError::Empty);
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity(item.product_id.clone()));
        }
        if item.unit_amount.is_some_and(|unit| unit < 0) {
            return Err(CartError::NegativeUnitAmount(item.product_id.clone()));
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(CartError::DuplicateProduct(item.product_id.clone()));
        }
    }

    calc_amount(items)
}

/// Number of decimal places in the currency's major unit
pub fn minor_unit_exponent(currency: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.to_ascii_lowercase().as_str()) {
        0
    } else {
        2
    }
}

/// Render a minor-unit amount for display (e.g. `2200, "usd"` → `$22.00`)
pub fn format_amount(amount: i64, currency: &str) -> String {
    let value = Decimal::new(amount, minor_unit_exponent(currency));
    match currency.to_ascii_lowercase().as_str() {
        "usd" | "cad" | "aud" => format!("${value}"),
        "eur" => format!("€{value}"),
        "gbp" => format!("£{value}"),
        "jpy" => format!("¥{value}"),
        other => format!("{value} {}", other.to_ascii_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: &str, unit: Option<i64>, qty: u32) -> CartLineItem {
        CartLineItem::new(id, id.to_uppercase(), unit).with_quantity(qty)
    }

    #[test]
    fn test_reference_cart_total() {
        let cart = vec![item("p1", Some(500), 2), item("p2", Some(1200), 1)];
        assert_eq!(calc_amount(&cart), Ok(2200));
    }

    #[test]
    fn test_amount_is_additive_over_disjoint_carts() {
        let a = vec![item("p1", Some(499), 3), item("p2", Some(1), 7)];
        let b = vec![item("p3", Some(12_000), 1), item("p4", Some(250), 4)];
        let joined: Vec<_> = a.iter().chain(b.iter()).cloned().collect();

        assert_eq!(
            calc_amount(&joined).unwrap(),
            calc_amount(&a).unwrap() + calc_amount(&b).unwrap()
        );
        assert_eq!(calc_amount(&[]), Ok(0));
    }

    #[test]
    fn test_missing_unit_amount_is_rejected() {
        let cart = vec![item("p1", Some(500), 1), item("p2", None, 1)];
        assert_eq!(
            calc_amount(&cart),
            Err(CartError::MissingUnitAmount("p2".into()))
        );
    }

    #[test]
    fn test_overflow_is_rejected() {
        let cart = vec![item("p1", Some(i64::MAX), 2)];
        assert_eq!(calc_amount(&cart), Err(CartError::AmountOverflow));
    }

    #[test]
    fn test_validate_chargeable() {
        assert_eq!(validate_chargeable(&[]), Err(CartError::Empty));
        assert_eq!(
            validate_chargeable(&[item("p1", Some(100), 0)]),
            Err(CartError::ZeroQuantity("p1".into()))
        );
        assert_eq!(
            validate_chargeable(&[item("p1", Some(100), 1), item("p1", Some(100), 1)]),
            Err(CartError::DuplicateProduct("p1".into()))
        );
        assert_eq!(
            validate_chargeable(&[item("p1", Some(-100), 1)]),
            Err(CartError::NegativeUnitAmount("p1".into()))
        );
        assert_eq!(validate_chargeable(&[item("p1", Some(100), 3)]), Ok(300));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Decimal::new(2200, 2), dec!(22.00));
        assert_eq!(format_amount(2200, "usd"), "$22.00");
        assert_eq!(format_amount(5, "eur"), "€0.05");
        assert_eq!(format_amount(1500, "jpy"), "¥1500");
        assert_eq!(format_amount(999, "chf"), "9.99 CHF");
    }
}
