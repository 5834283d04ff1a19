use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Point-in-time view of the session record
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Whether a capture is in progress
    pub active: bool,

    /// Artifact the active capture is writing to
    pub artifact_path: Option<PathBuf>,

    /// When the active capture started
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// `active` holds exactly when both the artifact path and start time are set
    pub fn is_consistent(&self) -> bool {
        self.active == self.artifact_path.is_some() && self.active == self.started_at.is_some()
    }
}
