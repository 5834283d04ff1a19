use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use super::protocol::{Command, Reply};
use crate::audio::PwRecordBackend;
use crate::capture::CaptureController;
use crate::clip::{self, ClipPolicy, ClipVerdict};
use crate::config::Config;
use crate::session::{BeginOutcome, EndError, SessionMachine, SessionSnapshot};
use crate::transcription::{self, Transcriber};

/// Daemon-wide context: the session state machine, the loaded speech engine
/// and the clip policy. Built once at startup and shared with the server.
pub struct Daemon {
    machine: SessionMachine,
    transcriber: Transcriber,
    policy: ClipPolicy,
}

impl Daemon {
    pub fn new(machine: SessionMachine, transcriber: Transcriber, policy: ClipPolicy) -> Self {
        Self {
            machine,
            transcriber,
            policy,
        }
    }

    /// Build the daemon from configuration, loading the speech model
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine = transcription::engine_from_config(&config.transcription)
            .context("Failed to initialize transcription engine")?;
        let transcriber = Transcriber::new(engine, config.transcription.language.clone());

        let backend = Arc::new(PwRecordBackend::new(&config.capture));
        let controller = CaptureController::new(backend, &config.capture);

        Ok(Self::new(
            SessionMachine::new(controller),
            transcriber,
            ClipPolicy::from(&config.clip),
        ))
    }

    pub async fn handle(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Start => self.start().await,
            Command::Stop => self.stop().await,
            Command::Invalid => Ok(Reply::InvalidCommand),
        }
    }

    async fn start(&self) -> Result<Reply> {
        Ok(match self.machine.begin().await? {
            BeginOutcome::Started => Reply::RecordingStarted,
            BeginOutcome::AlreadyRecording => Reply::AlreadyRecording,
        })
    }

    async fn stop(&self) -> Result<Reply> {
        let finished = match self.machine.end().await {
            Ok(finished) => finished,
            Err(EndError::NotRecording) => return Ok(Reply::NotRecording),
        };

        let artifact = match clip::validate(&self.policy, finished) {
            ClipVerdict::Usable { artifact, duration } => {
                info!("Transcribing {:.2}s clip...", duration.as_secs_f64());
                artifact
            }
            ClipVerdict::TooShort => return Ok(Reply::TooShort),
            ClipVerdict::NoAudio => return Ok(Reply::NoAudio),
        };

        let transcriber = self.transcriber.clone();
        let path = artifact.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || transcriber.transcribe(&path))
            .await
            .context("Transcription task panicked")?;

        // Artifact is removed whether or not transcription succeeded
        drop(artifact);

        match result {
            Ok(text) if text.is_empty() => {
                info!("No speech recognized");
                Ok(Reply::NoSpeech)
            }
            Ok(text) => Ok(Reply::Transcript(text)),
            Err(e) => {
                error!("{}, replying NO_SPEECH", e);
                Ok(Reply::NoSpeech)
            }
        }
    }

    /// Kill any running capture and delete its artifact
    pub async fn shutdown(&self) {
        self.machine.shutdown().await;
    }

    pub async fn session(&self) -> SessionSnapshot {
        self.machine.snapshot().await
    }
}
