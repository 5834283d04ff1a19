use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the optional config file (extension resolved by `config`)
pub const DEFAULT_CONFIG_PATH: &str = "config/speech-daemon";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub clip: ClipConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    /// Unix socket clients connect to
    pub socket_path: PathBuf,
    /// How long a client may take to send its command
    pub read_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "speech-daemon".to_string(),
            socket_path: PathBuf::from("/tmp/speech-to-text.sock"),
            read_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// External recorder, invoked once per capture
    pub program: String,
    /// PipeWire node to record from (recorder default when unset)
    pub target: Option<String>,
    pub sample_rate: u32,
    pub format: String,
    pub channels: u16,
    /// Where capture artifacts are written
    pub artifact_dir: PathBuf,
    /// Wait after SIGINT before the recorder is killed
    pub stop_grace_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: "pw-record".to_string(),
            target: Some("alsa_input.pci-0000_02_00.3.BuiltinMic".to_string()),
            sample_rate: 16000, // Whisper expects 16kHz
            format: "s16".to_string(),
            channels: 1,
            artifact_dir: std::env::temp_dir(),
            stop_grace_ms: 2000,
        }
    }
}

impl CaptureConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    pub min_duration_ms: u64,
    /// Artifacts smaller than this are treated as containing no audio
    pub min_bytes: u64,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 500,
            min_bytes: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process whisper.cpp, model loaded once at startup (`whisper` feature)
    #[default]
    Whisper,
    /// External program driven through `TranscriptionConfig::command`.
    /// The program loads the model again for every request.
    Command,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub engine: EngineKind,
    /// Model size name, e.g. "base" or "small.en"
    pub model: String,
    /// Explicit model file; derived from `model` when unset
    pub model_path: Option<String>,
    /// "cpu" or "gpu"
    pub device: String,
    pub compute_type: String,
    /// Spoken language; auto-detected when unset
    pub language: Option<String>,
    /// Program template for the command engine; placeholders `{audio}`,
    /// `{model_path}`, `{beam_size}`, `{language}`, `{device}`, `{compute_type}`
    pub command: Vec<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            model: "base".to_string(),
            model_path: None,
            device: "cpu".to_string(),
            compute_type: "int8".to_string(),
            language: None,
            command: [
                "whisper-cli",
                "-m",
                "{model_path}",
                "-f",
                "{audio}",
                "-bs",
                "{beam_size}",
                "-nt",
                "-np",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl TranscriptionConfig {
    pub fn resolved_model_path(&self) -> PathBuf {
        match &self.model_path {
            Some(path) => expand_path(path),
            None => expand_path(&format!("~/.cache/whisper/ggml-{}.bin", self.model)),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults for anything unset.
    ///
    /// A missing file is only an error when `required` is true.
    pub fn load(path: &str, required: bool) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(required))
            .build()?;

        let mut cfg: Config = settings.try_deserialize()?;
        cfg.service.socket_path = expand_path(&cfg.service.socket_path.to_string_lossy());
        cfg.capture.artifact_dir = expand_path(&cfg.capture.artifact_dir.to_string_lossy());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.program.trim().is_empty() {
            bail!("capture.program must not be empty");
        }
        if self.capture.sample_rate == 0 {
            bail!("capture.sample_rate must be positive");
        }
        if self.capture.channels == 0 {
            bail!("capture.channels must be positive");
        }
        if self.capture.stop_grace_ms == 0 {
            bail!("capture.stop_grace_ms must be positive");
        }
        if self.service.socket_path.as_os_str().is_empty() {
            bail!("service.socket_path must not be empty");
        }
        if self.transcription.engine == EngineKind::Command
            && self.transcription.command.is_empty()
        {
            bail!("transcription.command must name a program");
        }
        Ok(())
    }
}

fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => Path::new(expanded.as_ref()).to_path_buf(),
        Err(_) => PathBuf::from(raw),
    }
}
