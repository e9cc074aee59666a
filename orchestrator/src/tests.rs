//! End-to-end contract tests through the orchestration facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use voxstudio_engine::{
    AudioRef, EngineError, GenerateOptions, ModelArtifactRef, SynthesisEngine, TranscriptRef,
};
use voxstudio_store::{ProfileStore, StoreError, VoiceState};

use crate::{
    GenerateRequest, JobStatus, Orchestrator, OrchestratorConfig, OrchestratorError, TrainRequest,
};

struct FakeEngine {
    gate: Option<Arc<Semaphore>>,
    fail_train: AtomicBool,
}

impl FakeEngine {
    fn instant() -> Arc<Self> {
        Arc::new(Self {
            gate: None,
            fail_train: AtomicBool::new(false),
        })
    }

    fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let engine = Arc::new(Self {
            gate: Some(Arc::clone(&gate)),
            fail_train: AtomicBool::new(false),
        });
        (engine, gate)
    }
}

#[async_trait]
impl SynthesisEngine for FakeEngine {
    async fn train(
        &self,
        audio: &[AudioRef],
        _transcript: Option<&TranscriptRef>,
    ) -> Result<ModelArtifactRef, EngineError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail_train.load(Ordering::SeqCst) {
            return Err(EngineError::TrainingFailed("clipped samples".into()));
        }
        Ok(ModelArtifactRef::new(format!("model:{}", audio[0])))
    }

    async fn generate(
        &self,
        _model: &ModelArtifactRef,
        _text: &str,
        opts: &GenerateOptions,
    ) -> Result<AudioRef, EngineError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        Ok(opts.output.clone())
    }
}

fn orchestrator(engine: Arc<dyn SynthesisEngine>) -> Orchestrator {
    Orchestrator::new(OrchestratorConfig {
        store: Arc::new(ProfileStore::in_memory()),
        engine,
        max_concurrent_jobs: None,
    })
}

fn train_req(voice: &str, audio: &str) -> TrainRequest {
    TrainRequest {
        voice: voice.to_string(),
        audio: audio.into(),
        transcript: None,
    }
}

#[tokio::test]
async fn test_train_then_generate_scenario() {
    let svc = orchestrator(FakeEngine::instant());

    // train("a.wav", "alice"): profile created on the fly
    let j1 = svc.train(train_req("alice", "a.wav")).unwrap();
    let done = svc.wait(j1, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);

    assert_eq!(
        svc.list_voices().unwrap(),
        vec![("alice".to_string(), VoiceState::Ready)]
    );

    let j2 = svc
        .generate(GenerateRequest::new("alice", "hello", "out.wav"))
        .unwrap();
    let done = svc.wait(j2, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(done.result_ref.as_deref(), Some("out.wav"));
}

#[tokio::test]
async fn test_generate_unknown_voice_is_not_found() {
    let svc = orchestrator(FakeEngine::instant());

    let err = svc
        .generate(GenerateRequest::new("bob", "hi", "out.wav"))
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Store(StoreError::NotFound(_))
    ));
    assert_eq!(svc.active_jobs("bob"), 0);
}

#[tokio::test]
async fn test_generate_untrained_voice_is_not_ready() {
    // Gated engine keeps the profile in Training at generate time
    let (engine, _gate) = FakeEngine::gated();
    let svc = orchestrator(engine);
    svc.train(train_req("dave", "d.wav")).unwrap();

    let err = svc
        .generate(GenerateRequest::new("dave", "hi", "out.wav"))
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotReady { .. }));
    // Exactly the one training job, no generate job submitted
    assert_eq!(svc.active_jobs("dave"), 1);
}

#[tokio::test]
async fn test_validation_precedes_store_access() {
    let svc = orchestrator(FakeEngine::instant());

    // Unknown voice, but the bad speed is reported first
    let mut req = GenerateRequest::new("nobody", "hi", "out.wav");
    req.speed = 0.0;
    assert!(matches!(
        svc.generate(req).unwrap_err(),
        OrchestratorError::Validation(_)
    ));

    let mut req = GenerateRequest::new("nobody", "hi", "out.wav");
    req.speed = -1.5;
    assert!(matches!(
        svc.generate(req).unwrap_err(),
        OrchestratorError::Validation(_)
    ));

    let mut req = GenerateRequest::new("nobody", "hi", "out.wav");
    req.pitch = 30;
    assert!(matches!(
        svc.generate(req).unwrap_err(),
        OrchestratorError::Validation(_)
    ));

    assert!(matches!(
        svc.generate(GenerateRequest::new("nobody", "", "out.wav"))
            .unwrap_err(),
        OrchestratorError::Validation(_)
    ));
}

#[tokio::test]
async fn test_voice_name_validation() {
    let svc = orchestrator(FakeEngine::instant());

    assert!(matches!(
        svc.train(train_req("", "a.wav")).unwrap_err(),
        OrchestratorError::Validation(_)
    ));
    assert!(matches!(
        svc.train(train_req("bad:name", "a.wav")).unwrap_err(),
        OrchestratorError::Validation(_)
    ));
    let long = "x".repeat(65);
    assert!(matches!(
        svc.train(train_req(&long, "a.wav")).unwrap_err(),
        OrchestratorError::Validation(_)
    ));
    assert!(svc.list_voices().unwrap().is_empty());
}

#[tokio::test]
async fn test_retrain_reuses_profile() {
    let svc = orchestrator(FakeEngine::instant());

    let j1 = svc.train(train_req("alice", "a.wav")).unwrap();
    svc.wait(j1, None).await.unwrap();

    // Second train call reuses the existing profile instead of failing
    // with DuplicateName
    let j2 = svc.train(train_req("alice", "b.wav")).unwrap();
    let done = svc.wait(j2, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(svc.list_voices().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_training_surfaces_and_allows_retry() {
    let engine = FakeEngine::instant();
    let svc = orchestrator(Arc::clone(&engine) as _);

    engine.fail_train.store(true, Ordering::SeqCst);
    let j1 = svc.train(train_req("alice", "a.wav")).unwrap();
    let done = svc.wait(j1, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().contains("clipped samples"));
    assert_eq!(
        svc.list_voices().unwrap(),
        vec![("alice".to_string(), VoiceState::Failed)]
    );

    engine.fail_train.store(false, Ordering::SeqCst);
    let j2 = svc.train(train_req("alice", "b.wav")).unwrap();
    let done = svc.wait(j2, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(
        svc.list_voices().unwrap(),
        vec![("alice".to_string(), VoiceState::Ready)]
    );
}

#[tokio::test]
async fn test_delete_voice_busy_guard() {
    let (engine, gate) = FakeEngine::gated();
    let svc = orchestrator(engine);

    let id = svc.train(train_req("alice", "a.wav")).unwrap();
    let err = svc.delete_voice("alice").unwrap_err();
    assert!(matches!(err, OrchestratorError::Busy(_)));

    gate.add_permits(1);
    svc.wait(id, None).await.unwrap();
    svc.delete_voice("alice").unwrap();
    assert!(svc.list_voices().unwrap().is_empty());

    assert!(matches!(
        svc.delete_voice("alice").unwrap_err(),
        OrchestratorError::Store(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_wait_timeout_is_local_to_caller() {
    let (engine, gate) = FakeEngine::gated();
    let svc = orchestrator(engine);

    let id = svc.train(train_req("alice", "a.wav")).unwrap();
    let err = svc
        .wait(id, Some(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Job(voxstudio_jobs::JobError::Timeout)
    ));

    gate.add_permits(1);
    let done = svc.wait(id, None).await.unwrap();
    assert_eq!(done.status, JobStatus::Succeeded);
}
