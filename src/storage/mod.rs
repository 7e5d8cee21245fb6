//! Key-value persistence.
//!
//! Everything the tool remembers between runs lives under a handful of string
//! keys, each holding one JSON document. Writes always replace the whole value.

use std::rc::Rc;

use serde::{Serialize, de::DeserializeOwned};

pub use errors::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use snapshot::{
    SNAPSHOT_VERSION, decode_ledger, encode_ledger, ledger_value, load_ledger, save_ledger,
};

pub mod errors;
mod file;
mod memory;
mod snapshot;

/// Persisted key layout.
pub mod keys {
    pub const LEDGER: &str = "pettyCashData";
    pub const RECONCILIATION_HISTORY: &str = "reconciliationHistory";
    pub const LOW_BALANCE_THRESHOLD: &str = "lowBalanceThreshold";
    pub const CUSTOM_CATEGORIES: &str = "customCategories";
    pub const NOTIFICATION_SETTINGS: &str = "notificationSettings";
    pub const APPEARANCE_SETTINGS: &str = "appearanceSettings";
}

/// A synchronous string key-value store. Methods take `&self` so one store can
/// back the ledger, the reconciliation history and the settings at once.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

pub fn read_json<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Json {
            key: key.to_owned(),
            source,
        })
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Json {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}
