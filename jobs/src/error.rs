use thiserror::Error;

use voxstudio_store::StoreError;

use crate::job::JobId;

/// Errors reported by the scheduler.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("jobs: job not found: {0}")]
    NotFound(JobId),

    #[error("jobs: voice profile {name} is not ready (state: {state})")]
    NotReady { name: String, state: &'static str },

    #[error("jobs: unsupported: {0}")]
    Unsupported(String),

    #[error("jobs: voice profile {0} has active jobs")]
    Busy(String),

    #[error("jobs: timed out waiting for job")]
    Timeout,

    #[error("jobs: scheduler is shutting down")]
    ShuttingDown,

    #[error("jobs: store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for scheduler operations.
pub type JobResult<T> = Result<T, JobError>;
