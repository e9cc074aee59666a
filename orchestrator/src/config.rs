use std::sync::Arc;

use voxstudio_engine::SynthesisEngine;
use voxstudio_store::ProfileStore;

/// Configures an [`Orchestrator`](crate::Orchestrator).
///
/// Dependencies are explicit and injected at construction; there is no
/// ambient global state. The engine is mandatory: a deployment without
/// one fails at startup rather than degrading to a placeholder at call
/// time.
pub struct OrchestratorConfig {
    /// Profile registry. Required; the single source of truth for voice
    /// existence and state.
    pub store: Arc<ProfileStore>,

    /// The synthesis engine jobs run against. Required.
    pub engine: Arc<dyn SynthesisEngine>,

    /// Global cap on concurrently running jobs. `None` means unlimited;
    /// the engine or hardware may impose its own ceiling.
    pub max_concurrent_jobs: Option<usize>,
}
