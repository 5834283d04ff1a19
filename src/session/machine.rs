use anyhow::Result;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::session::Session;
use super::stats::SessionSnapshot;
use crate::capture::{CaptureController, FinishedCapture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    Started,
    AlreadyRecording,
}

#[derive(Debug, Error)]
pub enum EndError {
    #[error("not recording")]
    NotRecording,
}

/// IDLE/RECORDING state machine around the single session record
///
/// The guard covers only the state flip (plus the bounded recorder stop),
/// never validation or transcription.
pub struct SessionMachine {
    session: Mutex<Session>,
    capture: CaptureController,
}

impl SessionMachine {
    pub fn new(capture: CaptureController) -> Self {
        Self {
            session: Mutex::new(Session::default()),
            capture,
        }
    }

    /// Start a capture unless one is already running
    ///
    /// A duplicate START is a no-op. If the recorder cannot be launched the
    /// session stays IDLE and the error is returned.
    pub async fn begin(&self) -> Result<BeginOutcome> {
        let mut session = self.session.lock().await;

        if session.is_active() {
            info!("START ignored: already recording");
            return Ok(BeginOutcome::AlreadyRecording);
        }

        let capture = self.capture.start()?;
        session.activate(capture);
        Ok(BeginOutcome::Started)
    }

    /// Stop the active capture and return to IDLE
    ///
    /// The guard is released before the caller validates or transcribes the
    /// returned capture, so a new START is accepted immediately.
    pub async fn end(&self) -> Result<FinishedCapture, EndError> {
        let mut session = self.session.lock().await;

        let Some(capture) = session.clear() else {
            warn!("STOP received while idle");
            return Err(EndError::NotRecording);
        };

        // `capture` is owned here, so even if this future is dropped the
        // recorder is killed (kill_on_drop) and the artifact removed.
        let finished = self.capture.stop(capture).await;
        drop(session);

        Ok(finished)
    }

    /// Kill any running capture and discard its artifact
    pub async fn shutdown(&self) {
        let mut session = self.session.lock().await;
        if let Some(capture) = session.clear() {
            self.capture.abort(capture).await;
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }
}
