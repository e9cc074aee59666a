//! Voice subcommands: train, generate, voices, delete.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Args;

use voxstudio_orchestrator::{GenerateRequest, TrainRequest};

use super::{finish_job, open_orchestrator, print_json};
use crate::Cli;

/// Train (or retrain) a voice from reference audio.
#[derive(Args)]
pub struct TrainCommand {
    /// Voice name to create or retrain
    #[arg(short = 'n', long)]
    voice: String,

    /// Reference audio file
    #[arg(short, long)]
    audio: PathBuf,

    /// Transcript file paired with the audio
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Give up waiting after this many seconds (the job keeps running)
    #[arg(long)]
    timeout: Option<u64>,
}

impl TrainCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if !self.audio.exists() {
            bail!("audio file not found: {}", self.audio.display());
        }

        let svc = open_orchestrator(cli)?;
        let id = svc.train(TrainRequest {
            voice: self.voice.clone(),
            audio: self.audio.clone(),
            transcript: self.transcript.clone(),
        })?;
        eprintln!("training {} (job {id})", self.voice);

        let job = svc
            .wait(id, self.timeout.map(Duration::from_secs))
            .await?;
        finish_job(job, cli.json)
    }
}

/// Generate speech with a trained voice.
#[derive(Args)]
pub struct GenerateCommand {
    /// Voice to synthesize with
    #[arg(short = 'n', long)]
    voice: String,

    /// Text to speak
    #[arg(short, long)]
    text: String,

    /// Output audio file
    #[arg(short, long)]
    output: PathBuf,

    /// Speed multiplier (1.0 = natural rate)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Pitch shift in semitones
    #[arg(long, default_value_t = 0)]
    pitch: i32,

    /// Give up waiting after this many seconds (the job keeps running)
    #[arg(long)]
    timeout: Option<u64>,
}

impl GenerateCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        let id = svc.generate(GenerateRequest {
            voice: self.voice.clone(),
            text: self.text.clone(),
            output: self.output.clone(),
            speed: self.speed,
            pitch: self.pitch,
        })?;
        eprintln!("generating with {} (job {id})", self.voice);

        let job = svc
            .wait(id, self.timeout.map(Duration::from_secs))
            .await?;
        finish_job(job, cli.json)
    }
}

/// List known voices and their states.
#[derive(Args)]
pub struct VoicesCommand {}

impl VoicesCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        let voices = svc.list_voices()?;

        if cli.json {
            let entries: Vec<_> = voices
                .iter()
                .map(|(name, state)| {
                    serde_json::json!({ "name": name, "state": state.as_str() })
                })
                .collect();
            return print_json(&entries);
        }

        if voices.is_empty() {
            eprintln!("no voices trained yet");
            return Ok(());
        }
        for (name, state) in voices {
            println!("{name}\t{state}");
        }
        Ok(())
    }
}

/// Delete a voice profile.
#[derive(Args)]
pub struct DeleteCommand {
    /// Voice name to delete
    voice: String,
}

impl DeleteCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_orchestrator(cli)?;
        svc.delete_voice(&self.voice)?;
        eprintln!("deleted {}", self.voice);
        Ok(())
    }
}
