//! Synthesis job data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use voxstudio_engine::{AudioRef, GenerateOptions, TranscriptRef};

/// Unique identifier of a synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Train,
    Generate,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Train => f.write_str("train"),
            JobKind::Generate => f.write_str("generate"),
        }
    }
}

/// Job lifecycle: `Queued -> Running -> {Succeeded, Failed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true once the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific job payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobParams {
    Train {
        audio: Vec<AudioRef>,
        transcript: Option<TranscriptRef>,
    },
    Generate {
        text: String,
        opts: GenerateOptions,
    },
}

impl JobParams {
    pub fn kind(&self) -> JobKind {
        match self {
            JobParams::Train { .. } => JobKind::Train,
            JobParams::Generate { .. } => JobKind::Generate,
        }
    }
}

/// A request handed to [`Scheduler::submit`](crate::Scheduler::submit).
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub profile_name: String,
    pub params: JobParams,
}

/// A scheduled unit of work and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisJob {
    pub id: JobId,
    pub kind: JobKind,
    pub profile_name: String,
    pub params: JobParams,
    pub status: JobStatus,

    /// Output reference set on success: the model artifact for `Train`,
    /// the generated audio file for `Generate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,

    /// Error message set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SynthesisJob {
    pub(crate) fn from_spec(id: JobId, spec: JobSpec) -> Self {
        Self {
            id,
            kind: spec.params.kind(),
            profile_name: spec.profile_name,
            params: spec.params,
            status: JobStatus::Queued,
            result_ref: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod job_tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_id_parse_round_trip() {
        let id = JobId::new();
        let parsed = JobId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(JobId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_job_json_round_trip() {
        let job = SynthesisJob::from_spec(
            JobId::new(),
            JobSpec {
                profile_name: "alice".to_string(),
                params: JobParams::Train {
                    audio: vec![AudioRef::new("a.wav")],
                    transcript: None,
                },
            },
        );

        let bytes = serde_json::to_vec(&job).unwrap();
        let back: SynthesisJob = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.id, job.id);
        assert_eq!(back.profile_name, "alice");
        assert_eq!(back.status, JobStatus::Queued);
    }

    #[test]
    fn test_params_kind() {
        let train = JobParams::Train {
            audio: vec![],
            transcript: None,
        };
        assert_eq!(train.kind(), JobKind::Train);
    }
}
