//! The job scheduler: per-profile FIFO lanes over a shared worker pool.
//!
//! Bookkeeping (submit/status/cancel) never blocks on engine calls; only
//! lane runner tasks ever await the engine. Each profile has its own lane
//! with its own lock, so submissions for different profiles do not
//! contend on a single global lock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Semaphore, watch};
use tracing::{error, info, warn};

use voxstudio_engine::SynthesisEngine;
use voxstudio_store::{ProfileError, ProfileStore, VoiceState};

use crate::error::{JobError, JobResult};
use crate::job::{JobId, JobKind, JobParams, JobSpec, JobStatus, SynthesisJob};

struct JobEntry {
    job: Mutex<SynthesisJob>,
    tx: watch::Sender<JobStatus>,
}

impl JobEntry {
    fn snapshot(&self) -> SynthesisJob {
        self.job.lock().expect("lock poisoned").clone()
    }

    fn set_running(&self) {
        let mut job = self.job.lock().expect("lock poisoned");
        job.status = JobStatus::Running;
        drop(job);
        let _ = self.tx.send_replace(JobStatus::Running);
    }

    /// Records a terminal status. Fields are written before the watch
    /// update so waiters always observe the completed snapshot.
    fn finish(&self, status: JobStatus, result_ref: Option<String>, error: Option<String>) {
        let mut job = self.job.lock().expect("lock poisoned");
        job.status = status;
        job.result_ref = result_ref;
        job.error = error;
        job.finished_at = Some(Utc::now());
        drop(job);
        let _ = self.tx.send_replace(status);
    }
}

#[derive(Default)]
struct Lane {
    queue: VecDeque<JobId>,
    /// True while a runner task is draining this lane.
    busy: bool,
}

struct Inner {
    engine: Arc<dyn SynthesisEngine>,
    store: Arc<ProfileStore>,
    jobs: Mutex<HashMap<JobId, Arc<JobEntry>>>,
    lanes: Mutex<HashMap<String, Arc<Mutex<Lane>>>>,
    /// Global admission control; `None` means unlimited.
    permits: Option<Arc<Semaphore>>,
    running: watch::Sender<usize>,
    shutting_down: AtomicBool,
}

/// Serializes training and generation work per voice profile.
///
/// Same-profile submissions queue FIFO behind the active job; different
/// profiles run concurrently up to `max_concurrent_jobs`.
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Creates a scheduler over the given engine and profile store.
    /// Must be constructed inside a tokio runtime; worker tasks are
    /// spawned on submission.
    pub fn new(
        engine: Arc<dyn SynthesisEngine>,
        store: Arc<ProfileStore>,
        max_concurrent_jobs: Option<usize>,
    ) -> Self {
        let (running, _) = watch::channel(0usize);
        Self {
            inner: Arc::new(Inner {
                engine,
                store,
                jobs: Mutex::new(HashMap::new()),
                lanes: Mutex::new(HashMap::new()),
                permits: max_concurrent_jobs.map(|n| Arc::new(Semaphore::new(n))),
                running,
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Submits a job. Contention on the same profile enqueues rather than
    /// rejects; callers never need to retry.
    pub fn submit(&self, spec: JobSpec) -> JobResult<JobId> {
        let id = JobId::new();
        let kind = spec.params.kind();
        let profile_name = spec.profile_name.clone();
        let lane = self.inner.lane(&profile_name);

        // Validation and enqueue form one critical section per profile:
        // a concurrent delete_profile cannot slip between the existence
        // check and the queue push
        let start_runner = {
            let mut lane = lane.lock().expect("lock poisoned");

            if self.inner.shutting_down.load(Ordering::SeqCst) {
                return Err(JobError::ShuttingDown);
            }
            let profile = self.inner.store.get(&profile_name)?;
            if kind == JobKind::Generate && profile.state != VoiceState::Ready {
                return Err(JobError::NotReady {
                    name: profile_name,
                    state: profile.state.as_str(),
                });
            }

            let job = SynthesisJob::from_spec(id, spec);
            let (tx, _rx) = watch::channel(JobStatus::Queued);
            self.inner
                .jobs
                .lock()
                .expect("lock poisoned")
                .insert(id, Arc::new(JobEntry { job: Mutex::new(job), tx }));

            lane.queue.push_back(id);
            if lane.busy {
                false
            } else {
                lane.busy = true;
                true
            }
        };

        info!(job = %id, %kind, voice = %profile_name, "job submitted");

        if start_runner {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                run_lane(inner, profile_name, lane).await;
            });
        }

        Ok(id)
    }

    /// Returns a point-in-time snapshot of a job.
    pub fn status(&self, id: JobId) -> JobResult<SynthesisJob> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Cancels a queued job. A running job cannot be preempted (the
    /// engine is non-interruptible), so cancelling one is `Unsupported`.
    pub fn cancel(&self, id: JobId) -> JobResult<()> {
        let entry = self.entry(id)?;
        let profile_name = entry.snapshot().profile_name;
        let lane = self.inner.lane(&profile_name);

        let dequeued = {
            let mut lane = lane.lock().expect("lock poisoned");
            match lane.queue.iter().position(|queued| *queued == id) {
                Some(pos) => {
                    lane.queue.remove(pos);
                    true
                }
                None => false,
            }
        };

        if !dequeued {
            // Not in the queue: claimed by a runner or already terminal
            let status = entry.snapshot().status;
            return Err(if status.is_terminal() {
                JobError::Unsupported(format!("job already {status}"))
            } else {
                JobError::Unsupported("running job cannot be cancelled".to_string())
            });
        }

        entry.finish(JobStatus::Cancelled, None, None);
        info!(job = %id, voice = %profile_name, "job cancelled");
        Ok(())
    }

    /// Blocks until the job reaches a terminal status, returning the
    /// final snapshot. The timeout is local to the caller and does not
    /// affect job execution.
    pub async fn wait(&self, id: JobId, timeout: Option<Duration>) -> JobResult<SynthesisJob> {
        let entry = self.entry(id)?;
        let mut rx = entry.tx.subscribe();

        let until_terminal = async {
            loop {
                let status = *rx.borrow_and_update();
                if status.is_terminal() {
                    break;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, until_terminal)
                .await
                .map_err(|_| JobError::Timeout)?,
            None => until_terminal.await,
        }

        Ok(entry.snapshot())
    }

    /// Deletes a profile unless jobs still reference it. Runs under the
    /// profile's lane lock so it cannot interleave with a concurrent
    /// submit for the same voice.
    pub fn delete_profile(&self, profile_name: &str) -> JobResult<()> {
        let lane = self.inner.lane(profile_name);
        let lane = lane.lock().expect("lock poisoned");
        // `busy` stays set while the runner executes the final job, so
        // it also covers the running (non-queued) case
        if lane.busy || !lane.queue.is_empty() {
            return Err(JobError::Busy(profile_name.to_string()));
        }
        self.inner.store.delete(profile_name)?;
        Ok(())
    }

    /// Number of queued or running jobs referencing a profile.
    pub fn active_jobs(&self, profile_name: &str) -> usize {
        let jobs = self.inner.jobs.lock().expect("lock poisoned");
        jobs.values()
            .filter(|entry| {
                let job = entry.job.lock().expect("lock poisoned");
                job.profile_name == profile_name && !job.status.is_terminal()
            })
            .count()
    }

    /// Stops accepting submissions, cancels everything still queued and
    /// waits for running engine calls to finish.
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);

        let queued: Vec<JobId> = {
            let jobs = self.inner.jobs.lock().expect("lock poisoned");
            jobs.values()
                .filter_map(|entry| {
                    let job = entry.job.lock().expect("lock poisoned");
                    (job.status == JobStatus::Queued).then_some(job.id)
                })
                .collect()
        };
        for id in queued {
            // Races with lane promotion are fine; a claimed job reports
            // Unsupported and runs to completion
            if let Err(JobError::Unsupported(_)) = self.cancel(id) {
                warn!(job = %id, "job started during shutdown, letting it finish");
            }
        }

        if let Some(permits) = &self.inner.permits {
            permits.close();
        }

        let mut rx = self.inner.running.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
        info!("scheduler drained");
    }

    fn entry(&self, id: JobId) -> JobResult<Arc<JobEntry>> {
        self.inner
            .jobs
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }
}

impl Inner {
    fn lane(&self, profile_name: &str) -> Arc<Mutex<Lane>> {
        let mut lanes = self.lanes.lock().expect("lock poisoned");
        Arc::clone(lanes.entry(profile_name.to_string()).or_default())
    }

    fn entry(&self, id: JobId) -> Option<Arc<JobEntry>> {
        self.jobs.lock().expect("lock poisoned").get(&id).cloned()
    }
}

/// Drains one profile's lane: promote the next queued job, run it to
/// completion, repeat until the queue is empty.
async fn run_lane(inner: Arc<Inner>, profile_name: String, lane: Arc<Mutex<Lane>>) {
    loop {
        let _permit = match &inner.permits {
            Some(permits) => match Arc::clone(permits).acquire_owned().await {
                Ok(permit) => Some(permit),
                // Semaphore closed: shutdown already cancelled the queue
                Err(_) => {
                    let mut lane = lane.lock().expect("lock poisoned");
                    lane.busy = false;
                    return;
                }
            },
            None => None,
        };

        // Claim and count in one step so a concurrent shutdown drain
        // never observes zero running jobs while one is being promoted
        let id = {
            let mut lane = lane.lock().expect("lock poisoned");
            match lane.queue.pop_front() {
                Some(id) => {
                    inner.running.send_modify(|count| *count += 1);
                    id
                }
                None => {
                    lane.busy = false;
                    return;
                }
            }
        };

        let Some(entry) = inner.entry(id) else {
            inner.running.send_modify(|count| *count -= 1);
            continue;
        };

        entry.set_running();
        info!(job = %id, voice = %profile_name, "job running");

        execute(&inner, &profile_name, &entry).await;

        inner.running.send_modify(|count| *count -= 1);
    }
}

/// Runs one job through the engine and records the outcome. Engine
/// failures mark the job failed and never escape into the runner.
async fn execute(inner: &Inner, profile_name: &str, entry: &JobEntry) {
    let (id, params) = {
        let job = entry.job.lock().expect("lock poisoned");
        (job.id, job.params.clone())
    };

    match params {
        JobParams::Train { audio, transcript } => {
            let marked = inner.store.update(profile_name, |p| {
                p.state = VoiceState::Training;
                p.source_audio_refs = audio.iter().map(|a| a.to_string()).collect();
                p.transcript_ref = transcript
                    .as_ref()
                    .map(|t| t.path().display().to_string());
                p.last_error = None;
            });
            if let Err(e) = marked {
                error!(job = %id, voice = %profile_name, error = %e, "failed to mark profile training");
                entry.finish(JobStatus::Failed, None, Some(e.to_string()));
                return;
            }

            match inner.engine.train(&audio, transcript.as_ref()).await {
                Ok(artifact) => {
                    let updated = inner.store.update(profile_name, |p| {
                        p.state = VoiceState::Ready;
                        p.model_artifact = Some(artifact.to_string());
                        p.last_error = None;
                    });
                    match updated {
                        Ok(_) => {
                            info!(job = %id, voice = %profile_name, artifact = %artifact, "training succeeded");
                            entry.finish(JobStatus::Succeeded, Some(artifact.to_string()), None);
                        }
                        Err(e) => {
                            error!(job = %id, voice = %profile_name, error = %e, "failed to record trained profile");
                            entry.finish(JobStatus::Failed, None, Some(e.to_string()));
                        }
                    }
                }
                Err(engine_err) => {
                    error!(job = %id, voice = %profile_name, error = %engine_err, "training failed");
                    let recorded = inner.store.update(profile_name, |p| {
                        p.state = VoiceState::Failed;
                        p.last_error = Some(ProfileError {
                            kind: "engine".to_string(),
                            message: engine_err.to_string(),
                        });
                    });
                    if let Err(e) = recorded {
                        error!(job = %id, voice = %profile_name, error = %e, "failed to record training failure");
                    }
                    entry.finish(JobStatus::Failed, None, Some(engine_err.to_string()));
                }
            }
        }

        JobParams::Generate { text, opts } => {
            // Revalidate at execution time; a train job queued ahead of
            // us may have changed the profile since submission
            let artifact = match inner.store.get(profile_name) {
                Ok(profile) if profile.state == VoiceState::Ready => {
                    match profile.model_artifact {
                        Some(artifact) => voxstudio_engine::ModelArtifactRef::new(artifact),
                        None => {
                            entry.finish(
                                JobStatus::Failed,
                                None,
                                Some(format!("voice {profile_name} has no model artifact")),
                            );
                            return;
                        }
                    }
                }
                Ok(profile) => {
                    entry.finish(
                        JobStatus::Failed,
                        None,
                        Some(format!(
                            "voice {profile_name} is not ready (state: {})",
                            profile.state
                        )),
                    );
                    return;
                }
                Err(e) => {
                    entry.finish(JobStatus::Failed, None, Some(e.to_string()));
                    return;
                }
            };

            match inner.engine.generate(&artifact, &text, &opts).await {
                Ok(output) => {
                    info!(job = %id, voice = %profile_name, output = %output, "generation succeeded");
                    entry.finish(JobStatus::Succeeded, Some(output.to_string()), None);
                }
                Err(engine_err) => {
                    // Generation failure leaves the profile untouched
                    error!(job = %id, voice = %profile_name, error = %engine_err, "generation failed");
                    entry.finish(JobStatus::Failed, None, Some(engine_err.to_string()));
                }
            }
        }
    }
}
