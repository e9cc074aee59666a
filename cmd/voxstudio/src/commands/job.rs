//! Job subcommands: status, cancel, wait.
//!
//! Jobs live in the submitting process; these subcommands exist so every
//! contract operation has a CLI mapping, and they matter when the CLI is
//! pointed at a long-running deployment rather than a one-shot run.

use std::time::Duration;

use anyhow::Context;
use clap::Args;

use voxstudio_orchestrator::JobId;

use super::{finish_job, open_orchestrator, print_json};
use crate::Cli;

fn parse_job_id(s: &str) -> anyhow::Result<JobId> {
    JobId::parse(s).with_context(|| format!("invalid job id: {s}"))
}

/// Show a job snapshot.
#[derive(Args)]
pub struct StatusCommand {
    /// Job id as printed at submission
    job_id: String,
}

impl StatusCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        let job = svc.status(parse_job_id(&self.job_id)?)?;

        if cli.json {
            return print_json(&job);
        }
        println!("{}\t{}\t{}\t{}", job.id, job.kind, job.profile_name, job.status);
        Ok(())
    }
}

/// Cancel a queued job.
#[derive(Args)]
pub struct CancelCommand {
    /// Job id as printed at submission
    job_id: String,
}

impl CancelCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        let id = parse_job_id(&self.job_id)?;
        svc.cancel(id)?;
        eprintln!("cancelled {id}");
        Ok(())
    }
}

/// Block until a job finishes.
#[derive(Args)]
pub struct WaitCommand {
    /// Job id as printed at submission
    job_id: String,

    /// Give up after this many seconds (the job keeps running)
    #[arg(long)]
    timeout: Option<u64>,
}

impl WaitCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        let id = parse_job_id(&self.job_id)?;
        let job = svc
            .wait(id, self.timeout.map(Duration::from_secs))
            .await?;
        finish_job(job, cli.json)
    }
}
