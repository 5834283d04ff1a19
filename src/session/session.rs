use super::stats::SessionSnapshot;
use crate::capture::ActiveCapture;

/// The daemon's record of the in-progress capture
///
/// Artifact path and start time live inside `ActiveCapture`, so they are
/// either both present (RECORDING) or both absent (IDLE).
#[derive(Debug, Default)]
pub struct Session {
    capture: Option<ActiveCapture>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.capture.is_some()
    }

    pub(super) fn activate(&mut self, capture: ActiveCapture) {
        debug_assert!(self.capture.is_none());
        self.capture = Some(capture);
    }

    /// Clear the record, handing back the capture if there was one
    pub(super) fn clear(&mut self) -> Option<ActiveCapture> {
        self.capture.take()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.capture {
            Some(capture) => SessionSnapshot {
                active: true,
                artifact_path: Some(capture.artifact_path().to_path_buf()),
                started_at: Some(capture.started_at()),
            },
            None => SessionSnapshot {
                active: false,
                artifact_path: None,
                started_at: None,
            },
        }
    }
}
