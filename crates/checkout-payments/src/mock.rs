//! Mock Payment Processor
//!
//! In-memory stand-in for Stripe, for tests and local demos. Supports
//! out-of-band edits (cancel, delete, succeed) and an artificial latency
//! for exercising timeouts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PaymentError, Result};
use crate::processor::{CreateIntent, IntentStatus, PaymentIntent, PaymentProcessor};

/// Mock processor with in-memory intents
#[derive(Default)]
pub struct MockProcessor {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    latency: Mutex<Option<Duration>>,
    unavailable: Mutex<bool>,
    update_calls: AtomicUsize,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call (for timeout tests)
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Fail every call with `ProcessorUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    /// Look at an intent without going through the trait
    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        lock(&self.intents).get(intent_id).cloned()
    }

    /// Forget an intent, as if it never existed
    pub fn remove(&self, intent_id: &str) {
        lock(&self.intents).remove(intent_id);
    }

    /// Cancel an intent out of band
    pub fn cancel(&self, intent_id: &str) {
        self.set_status(intent_id, IntentStatus::Canceled);
    }

    /// Mark an intent paid out of band
    pub fn succeed(&self, intent_id: &str) {
        self.set_status(intent_id, IntentStatus::Succeeded);
    }

    /// Number of amount updates sent so far
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        lock(&self.intents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_status(&self, intent_id: &str, status: IntentStatus) {
        if let Some(intent) = lock(&self.intents).get_mut(intent_id) {
            intent.status = status;
        }
    }

    async fn simulate_network(&self) -> Result<()> {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if *lock(&self.unavailable) {
            return Err(PaymentError::ProcessorUnavailable("mock processor offline".into()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_intent(&self, request: CreateIntent) -> Result<PaymentIntent> {
        self.simulate_network().await?;

        let id = format!("pi_{}", uuid::Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret_mock")),
            id: id.clone(),
            amount: request.amount,
            currency: request.currency.to_ascii_lowercase(),
            status: IntentStatus::RequiresPaymentMethod,
        };
        lock(&self.intents).insert(id, intent.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<Option<PaymentIntent>> {
        self.simulate_network().await?;
        Ok(self.intent(intent_id))
    }

    async fn update_amount(&self, intent_id: &str, amount: i64) -> Result<PaymentIntent> {
        self.simulate_network().await?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let mut intents = lock(&self.intents);
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))?;

        if intent.status.is_canceled() || intent.status.is_succeeded() {
            return Err(PaymentError::Processor(format!(
                "intent {intent_id} cannot be updated in status {:?}",
                intent.status
            )));
        }

        intent.amount = amount;
        Ok(intent.clone())
    }

    fn name(&self) -> &str {
        "MockProcessor"
    }
}
