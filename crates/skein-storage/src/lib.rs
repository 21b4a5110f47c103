//! # Datachain Skein Storage
//!
//! Key-value persistence seam for contract state.
//!
//! The settlement engine only ever talks to the narrow [`KeyValueStore`]
//! trait. The in-memory store backs unit tests and single-process
//! deployments; a RocksDB-backed store slots in behind the same interface in
//! production.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Narrow persistence interface the engine depends on
///
/// Values are opaque byte strings; encoding is the caller's concern.
pub trait KeyValueStore {
    /// Read the value at `key`
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Write `value` at `key`, replacing any previous value
    fn set(&self, key: &str, value: Vec<u8>);

    /// Remove the value at `key`, reporting whether one existed
    fn remove(&self, key: &str) -> bool;

    /// Check whether `key` holds a value
    fn exists(&self, key: &str) -> bool;
}

/// In-memory key-value store
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        self.data.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    fn exists(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }
}

/// Read and decode a JSON-encoded record
///
/// `Ok(None)` when the key is absent; a decode failure is surfaced so the
/// caller can decide whether the record is disposable or load-bearing.
pub fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, serde_json::Error>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key) {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Encode and write a JSON record
pub fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), serde_json::Error>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let bytes = serde_json::to_vec(value)?;
    store.set(key, bytes);
    Ok(())
}
