//! Per-Intent Serialization
//!
//! The reconciler and the webhook consumer may race on the same payment
//! intent. Both take the intent's lock around their locate-then-update
//! sequence so that processor calls and store writes for one intent never
//! interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async mutexes keyed by payment intent id
#[derive(Default)]
pub struct IntentLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl IntentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one intent
    pub async fn lock(&self, payment_intent_id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries die with their last guard/waiter
            locks.retain(|_, weak| weak.strong_count() > 0);

            if let Some(existing) = locks.get(payment_intent_id).and_then(Weak::upgrade) {
                existing
            } else {
                let fresh = Arc::new(AsyncMutex::new(()));
                locks.insert(payment_intent_id.to_string(), Arc::downgrade(&fresh));
                fresh
            }
        };

        mutex.lock_owned().await
    }

    /// Number of intents currently locked or awaited
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
