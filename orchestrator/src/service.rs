//! The orchestration facade consumed identically by GUI, CLI and API
//! front ends.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use voxstudio_engine::{AudioRef, GenerateOptions, TranscriptRef};
use voxstudio_jobs::{JobError, JobId, JobParams, JobSpec, Scheduler, SynthesisJob};
use voxstudio_store::{ProfileStore, StoreError, VoiceState};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Longest accepted voice name.
const MAX_NAME_LEN: usize = 64;
/// Speed multiplier bounds; interpretation belongs to the engine.
const MAX_SPEED: f64 = 4.0;
/// Pitch shift bounds, in semitones.
const MAX_PITCH: i32 = 24;
/// Longest accepted generation text.
const MAX_TEXT_LEN: usize = 8192;

/// A training request: clone a voice from reference audio.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub voice: String,
    pub audio: PathBuf,
    pub transcript: Option<PathBuf>,
}

/// A generation request: synthesize speech with a trained voice.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub voice: String,
    pub text: String,
    pub output: PathBuf,
    pub speed: f64,
    pub pitch: i32,
}

impl GenerateRequest {
    /// A request with default prosody (natural speed, no pitch shift).
    pub fn new(voice: &str, text: &str, output: impl Into<PathBuf>) -> Self {
        Self {
            voice: voice.to_string(),
            text: text.to_string(),
            output: output.into(),
            speed: 1.0,
            pitch: 0,
        }
    }
}

/// The single orchestration contract all front ends consume.
///
/// Front ends never touch the store or scheduler directly and never
/// branch on caller type; CLI blocks on [`wait`](Self::wait) while GUI
/// and API poll [`status`](Self::status).
pub struct Orchestrator {
    store: Arc<ProfileStore>,
    scheduler: Scheduler,
}

impl Orchestrator {
    /// Builds the service from its injected dependencies. Must be called
    /// inside a tokio runtime.
    pub fn new(cfg: OrchestratorConfig) -> Self {
        let scheduler = Scheduler::new(cfg.engine, Arc::clone(&cfg.store), cfg.max_concurrent_jobs);
        Self {
            store: cfg.store,
            scheduler,
        }
    }

    /// Submits a training job, creating the profile if it does not exist
    /// yet (create-or-reuse; retraining an existing voice is the same
    /// call).
    pub fn train(&self, req: TrainRequest) -> OrchestratorResult<JobId> {
        validate_voice_name(&req.voice)?;
        if req.audio.as_os_str().is_empty() {
            return Err(OrchestratorError::Validation(
                "audio path must not be empty".to_string(),
            ));
        }

        match self.store.get(&req.voice) {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                self.store.create(&req.voice)?;
                info!(voice = %req.voice, "created voice profile");
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.scheduler.submit(JobSpec {
            profile_name: req.voice.clone(),
            params: JobParams::Train {
                audio: vec![AudioRef::new(req.audio)],
                transcript: req.transcript.map(TranscriptRef::new),
            },
        })?;
        info!(voice = %req.voice, job = %id, "training submitted");
        Ok(id)
    }

    /// Submits a generation job against a `Ready` voice. Parameter
    /// validation happens before any store access.
    pub fn generate(&self, req: GenerateRequest) -> OrchestratorResult<JobId> {
        validate_generate(&req)?;

        let profile = self.store.get(&req.voice)?;
        if profile.state != VoiceState::Ready {
            return Err(OrchestratorError::NotReady {
                name: req.voice.clone(),
                state: profile.state.as_str(),
            });
        }

        let id = self.scheduler.submit(JobSpec {
            profile_name: req.voice.clone(),
            params: JobParams::Generate {
                text: req.text,
                opts: GenerateOptions {
                    speed: req.speed,
                    pitch: req.pitch,
                    output: AudioRef::new(req.output),
                },
            },
        })?;
        info!(voice = %req.voice, job = %id, "generation submitted");
        Ok(id)
    }

    /// All known voices with their states, ordered by name.
    pub fn list_voices(&self) -> OrchestratorResult<Vec<(String, VoiceState)>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|p| (p.name, p.state))
            .collect())
    }

    /// Point-in-time snapshot of a job.
    pub fn status(&self, id: JobId) -> OrchestratorResult<SynthesisJob> {
        Ok(self.scheduler.status(id)?)
    }

    /// Cancels a queued job; running jobs cannot be preempted.
    pub fn cancel(&self, id: JobId) -> OrchestratorResult<()> {
        Ok(self.scheduler.cancel(id)?)
    }

    /// Blocks until the job is terminal or the timeout elapses. The
    /// synchronous CLI front end uses this; GUI/API poll `status`.
    pub async fn wait(
        &self,
        id: JobId,
        timeout: Option<Duration>,
    ) -> OrchestratorResult<SynthesisJob> {
        Ok(self.scheduler.wait(id, timeout).await?)
    }

    /// Deletes a voice profile, refusing while jobs still reference it.
    /// The check-and-delete is serialized against submissions for the
    /// same voice inside the scheduler.
    pub fn delete_voice(&self, name: &str) -> OrchestratorResult<()> {
        match self.scheduler.delete_profile(name) {
            Ok(()) => {
                info!(voice = %name, "deleted voice profile");
                Ok(())
            }
            Err(JobError::Busy(name)) => Err(OrchestratorError::Busy(name)),
            Err(JobError::Store(e)) => Err(OrchestratorError::Store(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of queued or running jobs for a voice.
    pub fn active_jobs(&self, name: &str) -> usize {
        self.scheduler.active_jobs(name)
    }

    /// Drains the scheduler: queued jobs are cancelled, running engine
    /// calls finish.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

fn validate_voice_name(name: &str) -> OrchestratorResult<()> {
    if name.is_empty() {
        return Err(OrchestratorError::Validation(
            "voice name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(OrchestratorError::Validation(format!(
            "voice name longer than {MAX_NAME_LEN} characters"
        )));
    }
    // ':' is the store's key separator
    if name.contains(':') {
        return Err(OrchestratorError::Validation(
            "voice name must not contain ':'".to_string(),
        ));
    }
    Ok(())
}

fn validate_generate(req: &GenerateRequest) -> OrchestratorResult<()> {
    validate_voice_name(&req.voice)?;
    if req.text.is_empty() {
        return Err(OrchestratorError::Validation(
            "text must not be empty".to_string(),
        ));
    }
    if req.text.len() > MAX_TEXT_LEN {
        return Err(OrchestratorError::Validation(format!(
            "text longer than {MAX_TEXT_LEN} bytes"
        )));
    }
    if !(req.speed > 0.0 && req.speed <= MAX_SPEED) {
        return Err(OrchestratorError::Validation(format!(
            "speed must be in (0, {MAX_SPEED}], got {}",
            req.speed
        )));
    }
    if req.pitch.abs() > MAX_PITCH {
        return Err(OrchestratorError::Validation(format!(
            "pitch must be within ±{MAX_PITCH} semitones, got {}",
            req.pitch
        )));
    }
    if req.output.as_os_str().is_empty() {
        return Err(OrchestratorError::Validation(
            "output path must not be empty".to_string(),
        ));
    }
    Ok(())
}
