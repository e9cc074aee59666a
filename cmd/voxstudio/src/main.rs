//! VoxStudio CLI - voice cloning from the command line.
//!
//! The synchronous front end over the orchestration core: each contract
//! operation maps to a subcommand, commands exit 0 on success and 1 on
//! any reported error.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    CancelCommand, DeleteCommand, GenerateCommand, StatusCommand, TrainCommand, VoicesCommand,
    WaitCommand,
};

/// VoxStudio CLI - clone voices and synthesize speech with them.
#[derive(Parser)]
#[command(name = "voxstudio")]
#[command(about = "Voice cloning and speech synthesis CLI")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the voice registry (default: ~/.voxstudio)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Cap on concurrently running jobs (default: unlimited)
    #[arg(long, global = true)]
    pub max_jobs: Option<usize>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train (or retrain) a voice from reference audio
    Train(TrainCommand),
    /// Generate speech with a trained voice
    Generate(GenerateCommand),
    /// List known voices and their states
    Voices(VoicesCommand),
    /// Show a job snapshot
    Status(StatusCommand),
    /// Cancel a queued job
    Cancel(CancelCommand),
    /// Block until a job finishes
    Wait(WaitCommand),
    /// Delete a voice profile
    Delete(DeleteCommand),
}

fn init_logging(level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating log directory {}", parent.display()))?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_ref())?;

    match &cli.command {
        Commands::Train(cmd) => cmd.run(&cli).await,
        Commands::Generate(cmd) => cmd.run(&cli).await,
        Commands::Voices(cmd) => cmd.run(&cli).await,
        Commands::Status(cmd) => cmd.run(&cli).await,
        Commands::Cancel(cmd) => cmd.run(&cli).await,
        Commands::Wait(cmd) => cmd.run(&cli).await,
        Commands::Delete(cmd) => cmd.run(&cli).await,
    }
}
