//! In-memory storage backend for tests and ephemeral runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::backend::StorageBackend;
use crate::error::StoreResult;

/// A non-durable backend over a sorted map. Safe for concurrent use.
#[derive(Default)]
pub struct MemoryBackend {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> StoreResult<bool> {
        let mut data = self.data.lock().expect("lock poisoned");
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut data = self.data.lock().expect("lock poisoned");
        Ok(data.remove(key).is_some())
    }

    fn scan(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_put_if_absent() {
        let backend = MemoryBackend::new();
        assert!(backend.put_if_absent("k", b"v1").unwrap());
        assert!(!backend.put_if_absent("k", b"v2").unwrap());
        assert_eq!(backend.get("k").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_memory_scan_sorted() {
        let backend = MemoryBackend::new();
        backend.put("voice:b", b"2").unwrap();
        backend.put("voice:a", b"1").unwrap();
        backend.put("job:x", b"3").unwrap();

        let results = backend.scan("voice:").unwrap();
        let keys: Vec<_> = results.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["voice:a", "voice:b"]);
    }
}
