//! In-process whisper.cpp engine.

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{DecodeOptions, Segment, SpeechEngine};
use crate::audio::AudioFile;
use crate::config::TranscriptionConfig;

const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Whisper model held in memory for the lifetime of the daemon
pub struct WhisperEngine {
    ctx: WhisperContext,
}

impl WhisperEngine {
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        let model_path = config.resolved_model_path();
        if !model_path.exists() {
            bail!("Whisper model not found: {}", model_path.display());
        }

        let model_str = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Model path is not UTF-8: {}", model_path.display()))?;

        info!(
            "Loading Whisper model '{}' from {} (device {}, compute type {})",
            config.model,
            model_path.display(),
            config.device,
            config.compute_type
        );

        let mut params = WhisperContextParameters::default();
        params.use_gpu(config.device.eq_ignore_ascii_case("gpu"));

        let ctx = WhisperContext::new_with_params(model_str, params)
            .map_err(|e| anyhow!("Failed to load Whisper model: {:?}", e))?;

        info!("Model loaded! Ready for transcription.");
        Ok(Self { ctx })
    }
}

impl SpeechEngine for WhisperEngine {
    fn recognize(&self, audio: &Path, options: &DecodeOptions) -> Result<Vec<Segment>> {
        let file = AudioFile::open(audio)?;
        if file.sample_rate != WHISPER_SAMPLE_RATE {
            bail!(
                "Expected {}Hz audio, got {}Hz",
                WHISPER_SAMPLE_RATE,
                file.sample_rate
            );
        }
        let samples = file.to_mono_f32();
        if samples.is_empty() {
            warn!("No samples in {}", audio.display());
            return Ok(Vec::new());
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {:?}", e))?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: options.beam_size as i32,
            patience: -1.0,
        });
        params.set_language(options.language.as_deref());
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| anyhow!("Transcription failed: {:?}", e))?;

        let mut segments = Vec::new();
        for segment in state.as_iter() {
            let text = segment
                .to_str()
                .map_err(|e| anyhow!("{:?}", e))
                .context("Failed to read whisper segment")?;
            segments.push(Segment::new(text));
        }
        Ok(segments)
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
