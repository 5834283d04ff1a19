use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use super::{DecodeOptions, Segment, SpeechEngine};
use crate::config::TranscriptionConfig;

/// Engine that shells out to a transcription program (e.g. whisper.cpp's `whisper-cli`)
///
/// Fallback for builds without the `whisper` feature. The program is started
/// per request, so it reloads the model every time.
///
/// Each non-empty line the program prints on stdout is one segment.
pub struct CommandEngine {
    template: Vec<String>,
    model_path: PathBuf,
    device: String,
    compute_type: String,
}

impl CommandEngine {
    pub fn new(template: Vec<String>, model_path: PathBuf) -> Result<Self> {
        if template.is_empty() {
            bail!("Transcription command template is empty");
        }
        Ok(Self {
            template,
            model_path,
            device: "cpu".to_string(),
            compute_type: "int8".to_string(),
        })
    }

    /// Values for the `{device}` and `{compute_type}` placeholders
    pub fn with_device(mut self, device: impl Into<String>, compute_type: impl Into<String>) -> Self {
        self.device = device.into();
        self.compute_type = compute_type.into();
        self
    }

    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        let engine = Self::new(config.command.clone(), config.resolved_model_path())?
            .with_device(&config.device, &config.compute_type);

        if engine.uses("{model_path}") && !engine.model_path.exists() {
            bail!("Whisper model not found: {}", engine.model_path.display());
        }
        if !engine.uses("{device}") && !config.device.eq_ignore_ascii_case("cpu") {
            warn!(
                "transcription.device = {:?} is ignored: command template has no {{device}}",
                config.device
            );
        }
        if !engine.uses("{compute_type}") && config.compute_type != "int8" {
            warn!(
                "transcription.compute_type = {:?} is ignored: command template has no {{compute_type}}",
                config.compute_type
            );
        }

        info!(
            "Command engine ready: {} (model {}, reloaded per request)",
            engine.template[0],
            engine.model_path.display()
        );
        Ok(engine)
    }

    fn uses(&self, placeholder: &str) -> bool {
        self.template.iter().any(|part| part.contains(placeholder))
    }

    fn expand(&self, audio: &Path, options: &DecodeOptions) -> Vec<String> {
        let audio = audio.display().to_string();
        let model = self.model_path.display().to_string();
        let beam = options.beam_size.to_string();
        let language = options.language.as_deref().unwrap_or("auto");

        self.template
            .iter()
            .map(|part| {
                part.replace("{audio}", &audio)
                    .replace("{model_path}", &model)
                    .replace("{beam_size}", &beam)
                    .replace("{language}", language)
                    .replace("{device}", &self.device)
                    .replace("{compute_type}", &self.compute_type)
            })
            .collect()
    }
}

impl SpeechEngine for CommandEngine {
    fn recognize(&self, audio: &Path, options: &DecodeOptions) -> Result<Vec<Segment>> {
        let argv = self.expand(audio, options);
        debug!("Running transcription command: {:?}", argv);

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", argv[0]))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                argv[0],
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Segment::new)
            .collect())
    }

    fn name(&self) -> &str {
        &self.template[0]
    }
}
