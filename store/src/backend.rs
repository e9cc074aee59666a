//! Storage backend trait for the profile store.

use crate::error::StoreResult;

/// Minimal byte-level storage the profile store sits on.
///
/// The memory implementation backs tests; the redb implementation backs
/// durable deployments. Keys are ordered strings so `scan` yields
/// profiles sorted by name.
pub trait StorageBackend: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Set a key-value pair, overwriting any existing value.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Insert only if the key is absent. Returns false (and leaves the
    /// stored value untouched) when the key already exists.
    fn put_if_absent(&self, key: &str, value: &[u8]) -> StoreResult<bool>;

    /// Remove a key. Returns false if the key was absent.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Scan key-value pairs under a prefix, sorted by key.
    fn scan(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>>;
}
