//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CheckoutCoreError>;

/// Reasons a cart snapshot cannot be charged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Line item has no price and must not be charged
    #[error("Line item {0} has no unit amount")]
    MissingUnitAmount(String),

    /// Nothing to charge
    #[error("Cart is empty")]
    Empty,

    /// Quantity of zero slipped through
    #[error("Line item {0} has zero quantity")]
    ZeroQuantity(String),

    /// Two line items share a product id
    #[error("Duplicate line item for product {0}")]
    DuplicateProduct(String),

    /// A negative unit amount was submitted
    #[error("Line item {0} has a negative unit amount")]
    NegativeUnitAmount(String),

    /// Total does not fit in the minor-unit integer
    #[error("Cart total overflows")]
    AmountOverflow,
}

/// Core error types
#[derive(Error, Debug)]
pub enum CheckoutCoreError {
    /// Cart validation failed
    #[error("Invalid cart: {0}")]
    Cart(#[from] CartError),

    /// Session lookup failed
    #[error("Session error: {0}")]
    Session(String),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckoutCoreError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutCoreError::Io(_) | CheckoutCoreError::Storage(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CheckoutCoreError::Cart(CartError::MissingUnitAmount(id)) => {
                format!("The item '{id}' is not currently for sale.")
            }
            CheckoutCoreError::Cart(CartError::Empty) => "Your cart is empty.".into(),
            CheckoutCoreError::Cart(err) => format!("Your cart could not be checked out: {err}"),
            CheckoutCoreError::Session(_) => "Please sign in again.".into(),
            CheckoutCoreError::Storage(_) | CheckoutCoreError::Io(_) => {
                "Your cart could not be saved on this device.".into()
            }
            CheckoutCoreError::Json(_) => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failures_retry() {
        assert!(CheckoutCoreError::Storage("disk full".into()).is_retryable());
        assert!(!CheckoutCoreError::Session("expired".into()).is_retryable());
        assert!(!CheckoutCoreError::from(CartError::Empty).is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let unpriced = CheckoutCoreError::from(CartError::MissingUnitAmount("p9".into()));
        assert_eq!(unpriced.user_message(), "The item 'p9' is not currently for sale.");

        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(
            CheckoutCoreError::from(json).user_message(),
            "An unexpected error occurred."
        );
    }
}
