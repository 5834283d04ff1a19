use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::CaptureConfig;

/// Capture backend trait
///
/// A backend knows how to launch an external recorder that writes raw audio
/// to `artifact` until it receives SIGINT. The capture controller owns the
/// resulting process; backends never track state themselves.
pub trait CaptureBackend: Send + Sync {
    /// Build the recorder command for one capture
    fn command(&self, artifact: &Path) -> Command;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// PipeWire recorder (`pw-record`)
///
/// Records 16kHz mono 16-bit PCM by default, matching what Whisper expects.
#[derive(Debug, Clone)]
pub struct PwRecordBackend {
    program: String,
    target: Option<String>,
    sample_rate: u32,
    format: String,
    channels: u16,
}

impl PwRecordBackend {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            program: config.program.clone(),
            target: config.target.clone(),
            sample_rate: config.sample_rate,
            format: config.format.clone(),
            channels: config.channels,
        }
    }

    fn args(&self, artifact: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if let Some(target) = &self.target {
            args.push(format!("--target={}", target));
        }
        args.push(format!("--rate={}", self.sample_rate));
        args.push(format!("--format={}", self.format));
        args.push(format!("--channels={}", self.channels));
        args.push(artifact.display().to_string());
        args
    }
}

impl CaptureBackend for PwRecordBackend {
    fn command(&self, artifact: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(artifact))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn pw_record_args_follow_config() {
        let backend = PwRecordBackend::new(&CaptureConfig::default());
        let args = backend.args(&PathBuf::from("/tmp/capture-1.wav"));

        assert_eq!(
            args,
            vec![
                "--target=alsa_input.pci-0000_02_00.3.BuiltinMic",
                "--rate=16000",
                "--format=s16",
                "--channels=1",
                "/tmp/capture-1.wav",
            ]
        );
    }

    #[test]
    fn pw_record_omits_unset_target() {
        let config = CaptureConfig {
            target: None,
            ..CaptureConfig::default()
        };
        let backend = PwRecordBackend::new(&config);
        let args = backend.args(&PathBuf::from("out.wav"));

        assert!(args.iter().all(|a| !a.starts_with("--target")));
        assert_eq!(args.last().map(String::as_str), Some("out.wav"));
    }

    #[test]
    fn command_uses_configured_program() {
        let backend = PwRecordBackend::new(&CaptureConfig::default());
        let cmd = backend.command(&PathBuf::from("a.wav"));

        assert_eq!(cmd.as_std().get_program(), "pw-record");
        assert_eq!(backend.name(), "pw-record");
    }
}
