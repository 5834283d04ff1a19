//! Clip validation: decides whether a finished capture is worth transcribing.

use std::time::Duration;
use tracing::info;

use crate::capture::{Artifact, FinishedCapture};
use crate::config::ClipConfig;

/// Thresholds a capture must meet before it is transcribed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipPolicy {
    pub min_duration: Duration,
    pub min_bytes: u64,
}

impl Default for ClipPolicy {
    fn default() -> Self {
        Self::from(&ClipConfig::default())
    }
}

impl From<&ClipConfig> for ClipPolicy {
    fn from(config: &ClipConfig) -> Self {
        Self {
            min_duration: Duration::from_millis(config.min_duration_ms),
            min_bytes: config.min_bytes,
        }
    }
}

#[derive(Debug)]
pub enum ClipVerdict {
    Usable { artifact: Artifact, duration: Duration },
    TooShort,
    NoAudio,
}

/// Classify a finished capture
///
/// Rejected artifacts are deleted before this returns.
pub fn validate(policy: &ClipPolicy, clip: FinishedCapture) -> ClipVerdict {
    let FinishedCapture { artifact, duration } = clip;

    if duration < policy.min_duration {
        info!(
            "Rejecting {}: too short ({:.2}s < {:.2}s)",
            artifact.path().display(),
            duration.as_secs_f64(),
            policy.min_duration.as_secs_f64()
        );
        return ClipVerdict::TooShort;
    }

    match artifact.size() {
        Some(size) if size >= policy.min_bytes => ClipVerdict::Usable { artifact, duration },
        size => {
            info!(
                "Rejecting {}: no audio ({} bytes)",
                artifact.path().display(),
                size.map_or_else(|| "missing".to_string(), |s| s.to_string())
            );
            ClipVerdict::NoAudio
        }
    }
}
