//! Transcription adapter
//!
//! The speech engine is loaded once at daemon start and reused for every
//! request. `Transcriber` turns whatever the engine does (errors, panics,
//! odd segment whitespace) into either trimmed text or a single opaque
//! `TranscriptionFailure`.

mod command;
#[cfg(feature = "whisper")]
mod whisper;

pub use command::CommandEngine;
#[cfg(feature = "whisper")]
pub use whisper::WhisperEngine;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{EngineKind, TranscriptionConfig};

/// Beam search width used for every request
pub const BEAM_SIZE: u32 = 5;

/// One recognized span of speech
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Decoding parameters handed to the engine
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub beam_size: u32,
    pub language: Option<String>,
}

/// Speech recognition backend
///
/// Calls are blocking and may take seconds; callers run them off the async runtime.
pub trait SpeechEngine: Send + Sync {
    fn recognize(&self, audio: &Path, options: &DecodeOptions) -> Result<Vec<Segment>>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Error)]
#[error("transcription failed: {0}")]
pub struct TranscriptionFailure(pub String);

#[derive(Clone)]
pub struct Transcriber {
    engine: Arc<dyn SpeechEngine>,
    options: DecodeOptions,
}

impl Transcriber {
    pub fn new(engine: Arc<dyn SpeechEngine>, language: Option<String>) -> Self {
        Self {
            engine,
            options: DecodeOptions {
                beam_size: BEAM_SIZE,
                language,
            },
        }
    }

    /// Recognize `audio` and return the joined, trimmed text
    ///
    /// Empty text is a successful result (silence), not a failure.
    pub fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionFailure> {
        let start = Instant::now();
        info!("Transcribing {} with {}", audio.display(), self.engine.name());

        let segments = self.engine.recognize(audio, &self.options).map_err(|e| {
            error!("Transcription error: {:#}", e);
            TranscriptionFailure(format!("{:#}", e))
        })?;

        let text = join_segments(&segments);
        info!(
            "Transcribed {} segments in {:.2}s ({} chars)",
            segments.len(),
            start.elapsed().as_secs_f64(),
            text.len()
        );
        Ok(text)
    }
}

fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Build the configured engine, loading its model
///
/// Called once at daemon start. A missing model is an error here, not on the
/// first request.
pub fn engine_from_config(config: &TranscriptionConfig) -> Result<Arc<dyn SpeechEngine>> {
    match config.engine {
        EngineKind::Command => Ok(Arc::new(CommandEngine::from_config(config)?)),
        #[cfg(feature = "whisper")]
        EngineKind::Whisper => Ok(Arc::new(WhisperEngine::from_config(config)?)),
        #[cfg(not(feature = "whisper"))]
        EngineKind::Whisper => anyhow::bail!(
            "built without the `whisper` feature; set transcription.engine = \"command\""
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_space_joined_and_trimmed() {
        let segments = vec![Segment::new(" hello"), Segment::new("world ")];
        assert_eq!(join_segments(&segments), "hello world");
    }

    #[test]
    fn no_segments_is_empty_text() {
        assert_eq!(join_segments(&[]), "");
        assert_eq!(join_segments(&[Segment::new("  "), Segment::new("\n")]), "");
    }
}
