//! Voice profile registry.
//!
//! This crate owns the [`VoiceProfile`] data model and the persistent
//! [`ProfileStore`], the single source of truth for profile existence and
//! lifecycle state. Storage sits behind a small [`StorageBackend`] trait
//! with an in-memory implementation for testing and a redb-based
//! implementation for durability.

pub mod backend;
pub mod error;
pub mod keys;
pub mod memory;
pub mod profile;
pub mod redb;
pub mod store;

pub use backend::StorageBackend;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use profile::{ProfileError, VoiceProfile, VoiceState};
pub use redb::RedbBackend;
pub use store::ProfileStore;
