//! Durable Cart Storage
//!
//! The cart survives reloads under a fixed key. Values are stored as a
//! versioned JSON envelope; an envelope from another version is dropped
//! rather than half-loaded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use checkout_core::{CheckoutCoreError, Result};

use crate::state::CartState;

/// Key the cart is persisted under
pub const CART_STORE_KEY: &str = "cart-storage";

const PERSIST_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Persisted {
    version: u32,
    state: CartState,
}

/// Key/value storage for cart snapshots
pub trait CartStorage: Send + Sync {
    /// Raw value under `key`
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    /// Decode the cart under `key`
    fn load(&self, key: &str) -> Result<Option<CartState>> {
        let Some(raw) = self.read(key)? else {
            return Ok(None);
        };
        let persisted: Persisted = serde_json::from_str(&raw)?;
        if persisted.version != PERSIST_VERSION {
            warn!(key, version = persisted.version, "Discarding cart from another version");
            return Ok(None);
        }
        Ok(Some(persisted.state))
    }

    /// Encode and write the cart under `key`
    fn save(&self, key: &str, state: &CartState) -> Result<()> {
        let raw = serde_json::to_string(&Persisted {
            version: PERSIST_VERSION,
            state: state.clone(),
        })?;
        self.write(key, &raw)
    }
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| CheckoutCoreError::Storage("cart storage lock poisoned".into()))
    }
}

impl CartStorage for MemoryCartStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    dir: PathBuf,
}

impl FileCartStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CheckoutCoreError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CartStorage for FileCartStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a truncated cart
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "Cart persisted");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
