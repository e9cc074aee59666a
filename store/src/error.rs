use thiserror::Error;

/// Errors reported by the profile store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: voice profile already exists: {0}")]
    DuplicateName(String),

    #[error("store: voice profile not found: {0}")]
    NotFound(String),

    #[error("store: invalid state transition for {name}: {from} -> {to}")]
    InvalidTransition {
        name: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
