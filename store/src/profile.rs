//! Voice profile data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a voice profile.
///
/// Legal transitions: `Untrained -> Training -> {Ready, Failed}`, and
/// `Ready`/`Failed` back into `Training` on retrain. Everything else is
/// rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoiceState {
    #[default]
    Untrained,
    Training,
    Ready,
    Failed,
}

impl VoiceState {
    /// Returns true if a profile may move from `self` to `to`.
    /// A no-op transition is always allowed so metadata-only updates
    /// don't have to special-case the state.
    pub fn can_transition(&self, to: VoiceState) -> bool {
        if *self == to {
            return true;
        }
        matches!(
            (self, to),
            (VoiceState::Untrained, VoiceState::Training)
                | (VoiceState::Training, VoiceState::Ready)
                | (VoiceState::Training, VoiceState::Failed)
                | (VoiceState::Ready, VoiceState::Training)
                | (VoiceState::Failed, VoiceState::Training)
        )
    }

    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceState::Untrained => "untrained",
            VoiceState::Training => "training",
            VoiceState::Ready => "ready",
            VoiceState::Failed => "failed",
        }
    }

    /// Parses a state from a string, defaulting to `Untrained`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "training" => VoiceState::Training,
            "ready" => VoiceState::Ready,
            "failed" => VoiceState::Failed,
            _ => VoiceState::Untrained,
        }
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VoiceState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VoiceState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(VoiceState::from_str(&s))
    }
}

/// Error record kept on a profile whose last training attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileError {
    pub kind: String,
    pub message: String,
}

/// A named voice profile and its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Unique human-chosen identifier, primary key in the store.
    pub name: String,

    pub state: VoiceState,

    /// Ordered source recordings the current model was trained from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_audio_refs: Vec<String>,

    /// Optional transcript paired with the training audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_ref: Option<String>,

    /// Artifact reference of the trained model, set once `Ready`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_artifact: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when `state` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ProfileError>,
}

impl VoiceProfile {
    /// Creates a fresh untrained profile.
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            state: VoiceState::Untrained,
            source_audio_refs: Vec::new(),
            transcript_ref: None,
            model_artifact: None,
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod profile_tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(VoiceState::Untrained.can_transition(VoiceState::Training));
        assert!(VoiceState::Training.can_transition(VoiceState::Ready));
        assert!(VoiceState::Training.can_transition(VoiceState::Failed));
        assert!(VoiceState::Ready.can_transition(VoiceState::Training));
        assert!(VoiceState::Failed.can_transition(VoiceState::Training));

        assert!(!VoiceState::Untrained.can_transition(VoiceState::Ready));
        assert!(!VoiceState::Ready.can_transition(VoiceState::Failed));
        assert!(!VoiceState::Failed.can_transition(VoiceState::Ready));
        assert!(!VoiceState::Training.can_transition(VoiceState::Untrained));
    }

    #[test]
    fn test_state_string_round_trip() {
        for state in [
            VoiceState::Untrained,
            VoiceState::Training,
            VoiceState::Ready,
            VoiceState::Failed,
        ] {
            assert_eq!(VoiceState::from_str(state.as_str()), state);
        }
        assert_eq!(VoiceState::from_str("garbage"), VoiceState::Untrained);
    }

    #[test]
    fn test_profile_json_round_trip() {
        let mut p = VoiceProfile::new("alice");
        p.state = VoiceState::Ready;
        p.source_audio_refs = vec!["a.wav".to_string()];
        p.model_artifact = Some("model-1".to_string());

        let bytes = serde_json::to_vec(&p).unwrap();
        let back: VoiceProfile = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.name, "alice");
        assert_eq!(back.state, VoiceState::Ready);
        assert_eq!(back.model_artifact.as_deref(), Some("model-1"));
    }
}
