//! Synthesis job scheduling.
//!
//! This crate owns the [`SynthesisJob`] table and the [`Scheduler`] that
//! runs jobs through the injected [`SynthesisEngine`]:
//! - at most one running job per voice profile, same-profile submissions
//!   queue FIFO instead of failing;
//! - jobs for different profiles run concurrently, capped only by the
//!   optional `max_concurrent_jobs` admission control;
//! - one job's failure never affects unrelated queued or running jobs.
//!
//! [`SynthesisEngine`]: voxstudio_engine::SynthesisEngine

pub mod error;
pub mod job;
pub mod scheduler;

pub use error::{JobError, JobResult};
pub use job::{JobId, JobKind, JobParams, JobSpec, JobStatus, SynthesisJob};
pub use scheduler::Scheduler;
