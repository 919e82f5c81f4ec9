//! Bounded External Calls
//!
//! No processor or store call may hang a request. Elapsed deadlines turn
//! into retryable errors; nothing after the timed-out call runs.

use std::future::Future;
use std::time::Duration;

use crate::error::{PaymentError, Result};

/// Deadlines for external collaborators
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub processor: Duration,
    pub store: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            processor: Duration::from_secs(10),
            store: Duration::from_secs(5),
        }
    }
}

impl Timeouts {
    /// Run a processor call under the processor deadline
    pub async fn processor<T, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.processor, call)
            .await
            .map_err(|_| {
                tracing::warn!(call = what, timeout = ?self.processor, "Payment processor call timed out");
                PaymentError::ProcessorUnavailable(format!("{what} timed out"))
            })?
    }

    /// Run a store call under the store deadline
    pub async fn store<T, F>(&self, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.store, call)
            .await
            .map_err(|_| {
                tracing::warn!(call = what, timeout = ?self.store, "Order store call timed out");
                PaymentError::StoreUnavailable(format!("{what} timed out"))
            })?
    }
}
