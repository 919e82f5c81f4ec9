//! Cart Store
//!
//! Single owner of the shopper's [`CartState`]. Every operation swaps in a
//! whole new `Arc<CartState>`; observers either see the old snapshot or the
//! new one and are woken only when something actually changed. Each change
//! is written through to [`CartStorage`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use checkout_core::{CartError, CartLineItem, CheckoutPhase};

use crate::state::{CartAction, CartState};
use crate::storage::{CartStorage, CART_STORE_KEY};

pub struct CartStore {
    state: watch::Sender<Arc<CartState>>,
    storage: Arc<dyn CartStorage>,
    key: String,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the store, restoring whatever was persisted under [`CART_STORE_KEY`]
    pub fn open(storage: Arc<dyn CartStorage>) -> Self {
        Self::open_with_key(storage, CART_STORE_KEY)
    }

    pub fn open_with_key(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let restored = match storage.load(&key) {
            Ok(Some(state)) => {
                debug!(key = %key, items = state.items.len(), "Cart restored");
                state
            }
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored cart unreadable, starting empty");
                CartState::default()
            }
        };

        let (state, _) = watch::channel(Arc::new(restored));
        Self { state, storage, key }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<CartState> {
        Arc::clone(&self.state.borrow())
    }

    /// Receive every future snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartState>> {
        self.state.subscribe()
    }

    /// Apply `action` and return the resulting snapshot
    pub fn dispatch(&self, action: &CartAction) -> Arc<CartState> {
        let mut next = None;
        self.state.send_if_modified(|current| {
            let reduced = current.reduce(action);
            if reduced == **current {
                return false;
            }
            let reduced = Arc::new(reduced);
            *current = Arc::clone(&reduced);
            next = Some(reduced);
            true
        });

        match next {
            Some(state) => {
                self.persist(&state);
                state
            }
            None => self.snapshot(),
        }
    }

    pub fn toggle(&self) -> Arc<CartState> {
        self.dispatch(&CartAction::Toggle)
    }

    /// Add one unit of `item`
    pub fn add(&self, item: CartLineItem) -> Arc<CartState> {
        self.dispatch(&CartAction::Add(item))
    }

    /// Remove one unit of `product_id`
    pub fn remove(&self, product_id: impl Into<String>) -> Arc<CartState> {
        self.dispatch(&CartAction::Remove(product_id.into()))
    }

    pub fn clear(&self) -> Arc<CartState> {
        self.dispatch(&CartAction::Clear)
    }

    pub fn set_intent_id(&self, id: Option<String>) -> Arc<CartState> {
        self.dispatch(&CartAction::SetIntentId(id.filter(|id| !id.is_empty())))
    }

    pub fn set_phase(&self, phase: CheckoutPhase) -> Arc<CartState> {
        self.dispatch(&CartAction::SetPhase(phase))
    }

    /// Display subtotal of the current cart
    pub fn subtotal(&self) -> Result<i64, CartError> {
        self.snapshot().subtotal()
    }

    /// The server accepted the cart under `intent_id`
    pub fn begin_checkout(&self, intent_id: impl Into<String>) -> Arc<CartState> {
        self.set_intent_id(Some(intent_id.into()));
        self.set_phase(CheckoutPhase::Checkout)
    }

    /// Payment went through: empty the cart and forget the intent
    pub fn complete_checkout(&self) -> Arc<CartState> {
        self.clear();
        self.set_intent_id(None);
        self.set_phase(CheckoutPhase::Success)
    }

    /// Back to browsing after a completed checkout
    pub fn reset_phase(&self) -> Arc<CartState> {
        self.set_phase(CheckoutPhase::Cart)
    }

    /// Storage failures never block the shopper; the in-memory cart stays authoritative
    fn persist(&self, state: &CartState) {
        if let Err(e) = self.storage.save(&self.key, state) {
            warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCartStorage;
    use checkout_core::{CheckoutCoreError, Result};

    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(CheckoutCoreError::Storage("disk gone".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CheckoutCoreError::Storage("disk gone".into()))
        }

        fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn mug() -> CartLineItem {
        CartLineItem::new("p1", "Mug", Some(500))
    }

    #[test]
    fn test_state_survives_reopen() {
        let storage = Arc::new(MemoryCartStorage::new());

        let store = CartStore::open(storage.clone());
        store.add(mug());
        store.add(mug());
        store.set_intent_id(Some("pi_abc".into()));
        store.set_phase(CheckoutPhase::Checkout);

        let reopened = CartStore::open(storage);
        let state = reopened.snapshot();
        assert_eq!(state.quantity_of("p1"), 2);
        assert_eq!(state.current_intent_id.as_deref(), Some("pi_abc"));
        assert_eq!(state.checkout_phase, CheckoutPhase::Checkout);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let store = CartStore::open(Arc::new(MemoryCartStorage::new()));
        let before = store.add(mug());
        let after = store.add(mug());

        assert_eq!(before.quantity_of("p1"), 1);
        assert_eq!(after.quantity_of("p1"), 2);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_no_op_keeps_snapshot() {
        let store = CartStore::open(Arc::new(MemoryCartStorage::new()));
        let before = store.snapshot();
        let after = store.remove("missing");

        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_empty_intent_id_is_none() {
        let store = CartStore::open(Arc::new(MemoryCartStorage::new()));
        store.set_intent_id(Some("pi_1".into()));
        assert_eq!(store.set_intent_id(Some(String::new())).current_intent_id, None);
    }

    #[test]
    fn test_checkout_lifecycle() {
        let store = CartStore::open(Arc::new(MemoryCartStorage::new()));
        store.add(mug());
        store.add(mug());
        assert_eq!(store.subtotal(), Ok(1000));

        let state = store.begin_checkout("pi_1");
        assert_eq!(state.current_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(state.checkout_phase, CheckoutPhase::Checkout);

        let state = store.complete_checkout();
        assert!(state.is_empty());
        assert!(state.current_intent_id.is_none());
        assert_eq!(state.checkout_phase, CheckoutPhase::Success);
        assert_eq!(store.reset_phase().checkout_phase, CheckoutPhase::Cart);
    }

    #[test]
    fn test_broken_storage_does_not_block() {
        let store = CartStore::open(Arc::new(BrokenStorage));
        assert!(store.snapshot().is_empty());

        let state = store.add(mug());
        assert_eq!(state.quantity_of("p1"), 1);
    }

    #[tokio::test]
    async fn test_observers_see_changes_only() {
        let store = CartStore::open(Arc::new(MemoryCartStorage::new()));
        let mut rx = store.subscribe();

        store.remove("missing");
        assert!(!rx.has_changed().unwrap());

        store.add(mug());
        assert!(rx.has_changed().unwrap());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().quantity_of("p1"), 1);
    }
}
