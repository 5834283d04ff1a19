use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::artifact::Artifact;
use crate::audio::CaptureBackend;
use crate::config::CaptureConfig;

/// A recorder process that is currently writing an artifact
#[derive(Debug)]
pub struct ActiveCapture {
    pub id: Uuid,
    artifact: Artifact,
    child: Child,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl ActiveCapture {
    pub fn artifact_path(&self) -> &Path {
        self.artifact.path()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

/// A capture whose recorder has exited
#[derive(Debug)]
pub struct FinishedCapture {
    pub artifact: Artifact,
    /// Wall-clock time between start and the stop request
    pub duration: Duration,
}

/// Owns the lifecycle of recorder processes
pub struct CaptureController {
    backend: Arc<dyn CaptureBackend>,
    artifact_dir: PathBuf,
    grace: Duration,
}

impl CaptureController {
    pub fn new(backend: Arc<dyn CaptureBackend>, config: &CaptureConfig) -> Self {
        info!(
            "Capture controller initialized: {} (grace period {}ms)",
            backend.name(),
            config.stop_grace_ms
        );

        Self {
            backend,
            artifact_dir: config.artifact_dir.clone(),
            grace: config.stop_grace(),
        }
    }

    /// Launch a recorder writing to a fresh artifact path
    ///
    /// Returns as soon as the process is spawned.
    pub fn start(&self) -> Result<ActiveCapture> {
        let id = Uuid::new_v4();
        let path = self.artifact_dir.join(format!("capture-{}.wav", id));

        let mut cmd = self.backend.command(&path);
        cmd.kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn recorder {}", self.backend.name()))?;

        info!("Recording started: {}", path.display());

        Ok(ActiveCapture {
            id,
            artifact: Artifact::new(path),
            child,
            started: Instant::now(),
            started_at: Utc::now(),
        })
    }

    /// Stop a recorder: SIGINT, bounded wait, then SIGKILL
    ///
    /// The process is reaped before this returns on every path.
    pub async fn stop(&self, capture: ActiveCapture) -> FinishedCapture {
        let ActiveCapture {
            id,
            artifact,
            mut child,
            started,
            ..
        } = capture;

        let duration = started.elapsed();

        if let Err(e) = interrupt(&child) {
            warn!("Failed to interrupt recorder for capture {}: {}", id, e);
        }

        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!("Recorder exited for capture {} ({})", id, status);
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for recorder of capture {}: {}", id, e);
                force_kill(&mut child, id).await;
            }
            Err(_) => {
                warn!(
                    "Recorder for capture {} ignored SIGINT for {}ms, killing",
                    id,
                    self.grace.as_millis()
                );
                force_kill(&mut child, id).await;
            }
        }

        info!(
            "Recording stopped: {} ({:.2}s)",
            artifact.path().display(),
            duration.as_secs_f64()
        );

        FinishedCapture { artifact, duration }
    }

    /// Kill a recorder outright and discard its artifact
    pub async fn abort(&self, capture: ActiveCapture) {
        let ActiveCapture {
            id,
            artifact,
            mut child,
            ..
        } = capture;

        info!("Aborting capture {}", id);
        force_kill(&mut child, id).await;
        drop(artifact);
    }
}

fn interrupt(child: &Child) -> io::Result<()> {
    // `id()` is None once the child has been reaped
    let Some(pid) = child.id() else {
        return Ok(());
    };

    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

async fn force_kill(child: &mut Child, id: Uuid) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }

    // kill() sends SIGKILL and reaps
    if let Err(e) = child.kill().await {
        error!("Failed to kill recorder for capture {}: {}", id, e);
    }
}
