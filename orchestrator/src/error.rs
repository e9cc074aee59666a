use thiserror::Error;

use voxstudio_jobs::JobError;
use voxstudio_store::StoreError;

/// Unified error surface for the three front ends.
///
/// Every variant carries enough context to render a useful message
/// without inspecting internal state. Validation failures are raised
/// before the store or scheduler is ever touched.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("voice {name} is not ready (state: {state})")]
    NotReady { name: String, state: &'static str },

    #[error("voice {0} has active jobs")]
    Busy(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Job(#[from] JobError),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
