//! Shared command plumbing.

use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;

use voxstudio_engine::{SynthesisEngine, UnavailableEngine};
use voxstudio_orchestrator::{JobStatus, Orchestrator, OrchestratorConfig, SynthesisJob};
use voxstudio_store::ProfileStore;

use crate::Cli;

/// Opens the durable voice registry under the data directory and wires
/// up the orchestrator. The engine is whatever implementation the build
/// links; this reference binary links the unavailable stand-in, which
/// makes every job fail with a clear diagnostic instead of pretending.
pub(crate) fn open_orchestrator(cli: &Cli) -> anyhow::Result<Orchestrator> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => dirs::home_dir()
            .context("cannot determine home directory, pass --data-dir")?
            .join(".voxstudio"),
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    let store = Arc::new(ProfileStore::open(data_dir.join("voices.redb"))?);
    let engine: Arc<dyn SynthesisEngine> = Arc::new(UnavailableEngine);

    Ok(Orchestrator::new(OrchestratorConfig {
        store,
        engine,
        max_concurrent_jobs: cli.max_jobs,
    }))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Maps a terminal job snapshot onto the CLI exit convention: success
/// prints the result reference, anything else exits 1 with the error.
pub(crate) fn finish_job(job: SynthesisJob, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&job)?;
    }
    match job.status {
        JobStatus::Succeeded => {
            if !json {
                if let Some(result) = &job.result_ref {
                    println!("{result}");
                }
            }
            Ok(())
        }
        JobStatus::Failed => {
            bail!(
                "job {} failed: {}",
                job.id,
                job.error.as_deref().unwrap_or("unknown error")
            )
        }
        JobStatus::Cancelled => bail!("job {} was cancelled", job.id),
        status => bail!("job {} still {status}", job.id),
    }
}
