//! The profile store: single source of truth for voice profile
//! existence and state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};
use crate::keys::{voice_key, voice_prefix};
use crate::memory::MemoryBackend;
use crate::profile::{ProfileError, VoiceProfile, VoiceState};
use crate::redb::RedbBackend;

/// Registry of named voice profiles.
///
/// Front ends never hold long-lived profile copies; they revalidate
/// against this store through the orchestrator before acting. Mutations
/// take a per-name lock so work on different profiles does not contend.
pub struct ProfileStore {
    backend: Box<dyn StorageBackend>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProfileStore {
    /// Open a durable store at the given path and run crash recovery:
    /// jobs do not survive the process, so any profile still marked
    /// `Training` is moved to `Failed`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let store = Self::with_backend(Box::new(RedbBackend::open(path)?));
        store.recover()?;
        Ok(store)
    }

    /// An ephemeral store for tests.
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new untrained profile.
    pub fn create(&self, name: &str) -> StoreResult<VoiceProfile> {
        let profile = VoiceProfile::new(name);
        let bytes = encode(&profile)?;
        if !self.backend.put_if_absent(&voice_key(name), &bytes)? {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        Ok(profile)
    }

    /// Fetch a profile by name.
    pub fn get(&self, name: &str) -> StoreResult<VoiceProfile> {
        match self.backend.get(&voice_key(name))? {
            Some(bytes) => decode(&bytes),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    /// Point-in-time snapshot of all profiles, ordered by name.
    pub fn list(&self) -> StoreResult<Vec<VoiceProfile>> {
        let mut profiles = Vec::new();
        for (_, bytes) in self.backend.scan(voice_prefix())? {
            profiles.push(decode(&bytes)?);
        }
        Ok(profiles)
    }

    /// Atomic read-modify-write of one profile.
    ///
    /// The mutator sees the current record and edits it in place; the
    /// store enforces the lifecycle invariant on whatever state the
    /// mutator left behind and bumps `updated_at`.
    pub fn update<F>(&self, name: &str, mutator: F) -> StoreResult<VoiceProfile>
    where
        F: FnOnce(&mut VoiceProfile),
    {
        let lock = self.entry_lock(name);
        let _guard = lock.lock().expect("lock poisoned");

        let mut profile = self.get(name)?;
        let from = profile.state;
        mutator(&mut profile);
        profile.name = name.to_string();

        if !from.can_transition(profile.state) {
            return Err(StoreError::InvalidTransition {
                name: name.to_string(),
                from: from.as_str(),
                to: profile.state.as_str(),
            });
        }

        profile.updated_at = Utc::now();
        self.backend.put(&voice_key(name), &encode(&profile)?)?;
        Ok(profile)
    }

    /// Delete a profile. The caller (orchestrator) is responsible for
    /// refusing deletion while jobs still reference the profile.
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        let lock = self.entry_lock(name);
        let _guard = lock.lock().expect("lock poisoned");

        if !self.backend.remove(&voice_key(name))? {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(())
    }

    /// Fail any profile left in `Training` by a previous process.
    pub fn recover(&self) -> StoreResult<()> {
        for profile in self.list()? {
            if profile.state != VoiceState::Training {
                continue;
            }
            warn!(voice = %profile.name, "recovering profile stuck in training");
            self.update(&profile.name, |p| {
                p.state = VoiceState::Failed;
                p.last_error = Some(ProfileError {
                    kind: "interrupted".to_string(),
                    message: "training interrupted by shutdown".to_string(),
                });
            })?;
        }
        Ok(())
    }

    fn entry_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock poisoned");
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}

fn encode(profile: &VoiceProfile) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(profile).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> StoreResult<VoiceProfile> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_duplicate() {
        let store = ProfileStore::in_memory();
        store.create("alice").unwrap();

        let err = store.create("alice").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));

        // Failed create leaves the original untouched
        let profile = store.get("alice").unwrap();
        assert_eq!(profile.state, VoiceState::Untrained);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_get_not_found() {
        let store = ProfileStore::in_memory();
        assert!(matches!(
            store.get("bob").unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_ordered_by_name() {
        let store = ProfileStore::in_memory();
        store.create("carol").unwrap();
        store.create("alice").unwrap();
        store.create("bob").unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_update_enforces_lifecycle() {
        let store = ProfileStore::in_memory();
        store.create("alice").unwrap();

        // Untrained cannot jump straight to Ready
        let err = store
            .update("alice", |p| p.state = VoiceState::Ready)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(store.get("alice").unwrap().state, VoiceState::Untrained);

        store
            .update("alice", |p| p.state = VoiceState::Training)
            .unwrap();
        let updated = store
            .update("alice", |p| {
                p.state = VoiceState::Ready;
                p.model_artifact = Some("model-1".to_string());
            })
            .unwrap();
        assert_eq!(updated.state, VoiceState::Ready);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn test_retrain_from_terminal_states() {
        let store = ProfileStore::in_memory();
        store.create("alice").unwrap();
        store
            .update("alice", |p| p.state = VoiceState::Training)
            .unwrap();
        store
            .update("alice", |p| p.state = VoiceState::Failed)
            .unwrap();

        // Failed profile may re-enter training
        store
            .update("alice", |p| p.state = VoiceState::Training)
            .unwrap();
        assert_eq!(store.get("alice").unwrap().state, VoiceState::Training);
    }

    #[test]
    fn test_delete() {
        let store = ProfileStore::in_memory();
        store.create("alice").unwrap();
        store.delete("alice").unwrap();
        assert!(matches!(
            store.delete("alice").unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_profiles_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voices.redb");

        {
            let store = ProfileStore::open(&path).unwrap();
            store.create("alice").unwrap();
            store
                .update("alice", |p| p.state = VoiceState::Training)
                .unwrap();
            store
                .update("alice", |p| {
                    p.state = VoiceState::Ready;
                    p.model_artifact = Some("model-1".to_string());
                })
                .unwrap();
        }

        let store = ProfileStore::open(&path).unwrap();
        let profile = store.get("alice").unwrap();
        assert_eq!(profile.state, VoiceState::Ready);
        assert_eq!(profile.model_artifact.as_deref(), Some("model-1"));
    }

    #[test]
    fn test_recovery_fails_interrupted_training() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voices.redb");

        {
            let store = ProfileStore::open(&path).unwrap();
            store.create("alice").unwrap();
            store
                .update("alice", |p| p.state = VoiceState::Training)
                .unwrap();
            // Process "crashes" with the profile mid-training
        }

        let store = ProfileStore::open(&path).unwrap();
        let profile = store.get("alice").unwrap();
        assert_eq!(profile.state, VoiceState::Failed);
        let err = profile.last_error.unwrap();
        assert_eq!(err.kind, "interrupted");
    }
}
