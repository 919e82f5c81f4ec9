//! Payment Error Types

use checkout_core::CartError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Checkout and webhook errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// No authenticated caller
    #[error("Unauthorized")]
    Unauthorized,

    /// The processor no longer knows the intent (or it was canceled)
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    /// The processor knows the intent but no order references it
    #[error("No order for payment intent: {0}")]
    OrderNotFound(String),

    /// The order was already paid and is frozen
    #[error("Order already complete for payment intent: {0}")]
    OrderFinalized(String),

    /// Webhook signature verification failed or the payload is malformed
    #[error("Webhook signature invalid: {0}")]
    InvalidSignature(String),

    /// Cart snapshot cannot be charged
    #[error("Invalid cart: {0}")]
    InvalidCart(#[from] CartError),

    /// Processor timed out or is unreachable
    #[error("Payment processor unavailable: {0}")]
    ProcessorUnavailable(String),

    /// Order store timed out or is unreachable
    #[error("Order store unavailable: {0}")]
    StoreUnavailable(String),

    /// Processor rejected the request
    #[error("Stripe error: {0}")]
    Processor(String),

    /// Order store rejected the request
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::ProcessorUnavailable(_) | PaymentError::StoreUnavailable(_)
        )
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Unauthorized => "UNAUTHORIZED",
            PaymentError::IntentNotFound(_) => "INTENT_NOT_FOUND",
            PaymentError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            PaymentError::OrderFinalized(_) => "ORDER_FINALIZED",
            PaymentError::InvalidSignature(_) => "INVALID_SIGNATURE",
            PaymentError::InvalidCart(_) => "INVALID_CART",
            PaymentError::ProcessorUnavailable(_) => "PROCESSOR_UNAVAILABLE",
            PaymentError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            PaymentError::Processor(_) => "PROCESSOR_ERROR",
            PaymentError::Storage(_) => "STORAGE_ERROR",
            PaymentError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Unauthorized => "Please sign in to check out.".into(),
            PaymentError::IntentNotFound(_) => {
                "Your checkout session expired. Please start checkout again.".into()
            }
            PaymentError::OrderNotFound(_) => {
                "We could not find the order for this checkout. Please contact support.".into()
            }
            PaymentError::OrderFinalized(_) => "This order has already been paid.".into(),
            PaymentError::InvalidCart(err) => format!("Your cart could not be checked out: {err}"),
            PaymentError::ProcessorUnavailable(_) | PaymentError::StoreUnavailable(_) => {
                "Checkout is temporarily unavailable. Please try again.".into()
            }
            PaymentError::Processor(_) => "Payment processing failed. Please try again.".into(),
            PaymentError::Config(_) => "Service configuration error.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}
