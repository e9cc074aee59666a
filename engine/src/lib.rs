//! Synthesis engine capability interface.
//!
//! The orchestration core treats the actual voice model as an opaque
//! capability: something that can train a voice from reference audio and
//! generate speech from a trained artifact. Implementations live outside
//! this workspace and are injected at startup; the core never falls back
//! to a placeholder when no engine is available.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for engine operations.
///
/// The scheduler treats any engine error as job failure; it never retries
/// automatically and never lets an engine failure take down other jobs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine: training failed: {0}")]
    TrainingFailed(String),
    #[error("engine: synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("engine: unavailable: {0}")]
    Unavailable(String),
    #[error("engine: io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reference to an audio file (source recording or generated output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRef(pub PathBuf);

impl AudioRef {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for AudioRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Reference to a transcript file paired with training audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRef(pub PathBuf);

impl TranscriptRef {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Reference to a trained model artifact produced by [`SynthesisEngine::train`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifactRef(pub String);

impl ModelArtifactRef {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generation parameters the engine interprets.
///
/// The core only validates ranges (`speed` positive, `pitch` a semitone
/// shift); what they mean acoustically is the engine's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Playback speed multiplier. 1.0 is the voice's natural rate.
    pub speed: f64,
    /// Pitch shift in semitones.
    pub pitch: i32,
    /// Destination the engine writes the generated audio to.
    pub output: AudioRef,
}

/// Interface for the external synthesis engine.
///
/// Both operations may take substantial wall-clock time and are
/// non-interruptible once started; the scheduler only invokes them from
/// worker tasks, never from its bookkeeping paths.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Trains a voice model from reference audio, returning the artifact
    /// reference the caller stores for later generation.
    async fn train(
        &self,
        audio: &[AudioRef],
        transcript: Option<&TranscriptRef>,
    ) -> Result<ModelArtifactRef, EngineError>;

    /// Generates speech for `text` using a trained model, writing the
    /// audio to `opts.output` and returning a reference to it.
    async fn generate(
        &self,
        model: &ModelArtifactRef,
        text: &str,
        opts: &GenerateOptions,
    ) -> Result<AudioRef, EngineError>;
}

/// An engine that reports itself unavailable for every call.
///
/// Deployments link a real engine; this exists so the reference CLI can
/// be wired end to end and fail with a diagnostic instead of a panic.
pub struct UnavailableEngine;

#[async_trait]
impl SynthesisEngine for UnavailableEngine {
    async fn train(
        &self,
        _audio: &[AudioRef],
        _transcript: Option<&TranscriptRef>,
    ) -> Result<ModelArtifactRef, EngineError> {
        Err(EngineError::Unavailable(
            "no synthesis engine linked into this build".to_string(),
        ))
    }

    async fn generate(
        &self,
        _model: &ModelArtifactRef,
        _text: &str,
        _opts: &GenerateOptions,
    ) -> Result<AudioRef, EngineError> {
        Err(EngineError::Unavailable(
            "no synthesis engine linked into this build".to_string(),
        ))
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::TrainingFailed("corrupt wav header".to_string());
        assert!(err.to_string().contains("corrupt wav header"));

        let err = EngineError::Unavailable("no model".to_string());
        assert!(err.to_string().starts_with("engine: unavailable"));
    }

    #[tokio::test]
    async fn test_unavailable_engine_refuses() {
        let engine = UnavailableEngine;
        let result = engine.train(&[AudioRef::new("a.wav")], None).await;
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }
}
