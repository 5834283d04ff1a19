// Shared fixtures for integration tests: shell-driven recorders, scripted
// speech engines and a daemon running on a temporary socket.

#![allow(dead_code)]

use anyhow::{bail, Result};
use speech_daemon::config::CaptureConfig;
use speech_daemon::transcription::DecodeOptions;
use speech_daemon::{
    CaptureBackend, CaptureController, ClipPolicy, CommandServer, Daemon, Segment,
    SessionMachine, SpeechEngine, Transcriber,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Recorder stand-in: runs `sh -c <script>` with the artifact path as `$0`
pub struct ShellBackend {
    program: String,
    script: String,
}

impl ShellBackend {
    /// Writes `bytes` of data, then records until interrupted
    ///
    /// Only shell builtins run before `exec`, so no stray child can write
    /// the artifact after the recorder is stopped.
    pub fn writes(bytes: usize) -> Self {
        Self::script(format!("printf '%{}s' '' > \"$0\"; exec sleep 30", bytes))
    }

    /// Never creates the artifact
    pub fn silent() -> Self {
        Self::script("exec sleep 30")
    }

    /// Writes audio but ignores SIGINT, so only a kill stops it
    pub fn stubborn() -> Self {
        Self::script("trap '' INT; printf '%4096s' '' > \"$0\"; exec sleep 30")
    }

    /// Program that does not exist
    pub fn missing() -> Self {
        Self {
            program: "/nonexistent/recorder".to_string(),
            script: String::new(),
        }
    }

    fn script(script: impl Into<String>) -> Self {
        Self {
            program: "sh".to_string(),
            script: script.into(),
        }
    }
}

impl CaptureBackend for ShellBackend {
    fn command(&self, artifact: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c").arg(&self.script).arg(artifact);
        cmd
    }

    fn name(&self) -> &str {
        "shell"
    }
}

pub enum Script {
    Segments(Vec<&'static str>),
    Fail,
    Panic,
    /// Blocks for the given time, then returns nothing
    Stall(Duration),
}

/// Speech engine returning a fixed result and counting calls
pub struct ScriptedEngine {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechEngine for ScriptedEngine {
    fn recognize(&self, audio: &Path, options: &DecodeOptions) -> Result<Vec<Segment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(audio.exists(), "artifact must exist while transcribing");
        assert_eq!(options.beam_size, 5);

        match &self.script {
            Script::Segments(texts) => Ok(texts.iter().map(|t| Segment::new(*t)).collect()),
            Script::Fail => bail!("corrupt audio"),
            Script::Panic => panic!("engine crashed"),
            Script::Stall(delay) => {
                std::thread::sleep(*delay);
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn capture_config(dir: &Path, grace_ms: u64) -> CaptureConfig {
    CaptureConfig {
        artifact_dir: dir.to_path_buf(),
        stop_grace_ms: grace_ms,
        ..CaptureConfig::default()
    }
}

pub fn controller(backend: ShellBackend, dir: &Path, grace_ms: u64) -> CaptureController {
    CaptureController::new(Arc::new(backend), &capture_config(dir, grace_ms))
}

pub fn policy(min_duration_ms: u64) -> ClipPolicy {
    ClipPolicy {
        min_duration: Duration::from_millis(min_duration_ms),
        min_bytes: 1000,
    }
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

pub fn process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

/// A daemon serving on a socket inside its own temporary directory
pub struct Harness {
    pub socket: PathBuf,
    pub artifacts: PathBuf,
    pub engine: Arc<ScriptedEngine>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<()>>>,
    _dir: TempDir,
}

impl Harness {
    pub async fn start(backend: ShellBackend, script: Script, policy: ClipPolicy) -> Self {
        Self::start_with_timeout(backend, script, policy, Duration::from_secs(5)).await
    }

    pub async fn start_with_timeout(
        backend: ShellBackend,
        script: Script,
        policy: ClipPolicy,
        read_timeout: Duration,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let artifacts = dir.path().join("artifacts");
        std::fs::create_dir_all(&artifacts).unwrap();
        let socket = dir.path().join("run").join("speech.sock");

        let engine = ScriptedEngine::new(script);
        let daemon = Daemon::new(
            SessionMachine::new(controller(backend, &artifacts, 500)),
            Transcriber::new(engine.clone(), None),
            policy,
        );
        let server = CommandServer::new(socket.clone(), read_timeout, Arc::new(daemon));

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.run(async {
            let _ = rx.await;
        }));

        for _ in 0..200 {
            if socket.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(socket.exists(), "daemon did not bind its socket");

        Self {
            socket,
            artifacts,
            engine,
            shutdown: Some(tx),
            handle: Some(handle),
            _dir: dir,
        }
    }

    pub async fn send(&self, command: &str) -> String {
        self.send_bytes(command.as_bytes()).await
    }

    pub async fn send_bytes(&self, bytes: &[u8]) -> String {
        let mut stream = UnixStream::connect(&self.socket).await.unwrap();
        stream.write_all(bytes).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    pub fn artifacts(&self) -> Vec<PathBuf> {
        files_in(&self.artifacts)
    }

    /// Signal shutdown and wait for the accept loop to finish
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}
