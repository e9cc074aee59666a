//! Voice orchestration facade.
//!
//! One contract for all three front ends (GUI, CLI, HTTP API):
//! [`Orchestrator::train`], [`Orchestrator::generate`],
//! [`Orchestrator::list_voices`], plus job inspection via `status` /
//! `cancel` / `wait`. The service validates parameters, keeps the
//! profile store authoritative, and delegates execution to the job
//! scheduler.

pub mod config;
pub mod error;
pub mod service;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use service::{GenerateRequest, Orchestrator, TrainRequest};

pub use voxstudio_jobs::{JobId, JobStatus, SynthesisJob};
pub use voxstudio_store::VoiceState;

#[cfg(test)]
mod tests;
