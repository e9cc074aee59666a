//! Redb-backed durable storage backend.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("voices");

/// A durable backend for the profile store.
pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(|e| StoreError::Storage(e.to_string()))?;

        // Create the table so first reads don't fail
        let tx = db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let _ = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db })
    }
}

impl StorageBackend for RedbBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        match table
            .get(key)
            .map_err(|e| StoreError::Storage(e.to_string()))?
        {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> StoreResult<bool> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let inserted;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let exists = table
                .get(key)
                .map_err(|e| StoreError::Storage(e.to_string()))?
                .is_some();
            if exists {
                inserted = false;
            } else {
                table
                    .insert(key, value)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                inserted = true;
            }
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(inserted)
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let removed;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            removed = table
                .remove(key)
                .map_err(|e| StoreError::Storage(e.to_string()))?
                .is_some();
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(removed)
    }

    fn scan(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for item in table.iter().map_err(|e| StoreError::Storage(e.to_string()))? {
            let (key, value) = item.map_err(|e| StoreError::Storage(e.to_string()))?;
            let key_str = key.value();
            if key_str.starts_with(prefix) {
                results.push((key_str.to_string(), value.value().to_vec()));
            }
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_redb_basic() {
        let dir = tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("voices.redb")).unwrap();

        backend.put("voice:alice", b"{}").unwrap();
        assert_eq!(backend.get("voice:alice").unwrap(), Some(b"{}".to_vec()));

        assert!(backend.remove("voice:alice").unwrap());
        assert!(!backend.remove("voice:alice").unwrap());
        assert_eq!(backend.get("voice:alice").unwrap(), None);
    }

    #[test]
    fn test_redb_put_if_absent() {
        let dir = tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("voices.redb")).unwrap();

        assert!(backend.put_if_absent("voice:a", b"1").unwrap());
        assert!(!backend.put_if_absent("voice:a", b"2").unwrap());
        assert_eq!(backend.get("voice:a").unwrap(), Some(b"1".to_vec()));
    }
}
