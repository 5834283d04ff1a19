use anyhow::{Context, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::daemon::Daemon;
use super::protocol::{Command, Reply, MAX_COMMAND_BYTES};

/// Socket file permissions (owner read/write only)
const SOCKET_MODE: u32 = 0o600;

/// Sequential accept loop on the daemon's Unix socket
pub struct CommandServer {
    socket_path: PathBuf,
    read_timeout: Duration,
    daemon: Arc<Daemon>,
}

impl CommandServer {
    pub fn new(socket_path: PathBuf, read_timeout: Duration, daemon: Arc<Daemon>) -> Self {
        Self {
            socket_path,
            read_timeout,
            daemon,
        }
    }

    /// Serve connections one at a time until `shutdown` resolves
    ///
    /// On the way out any running capture is killed and the socket file removed.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let listener = bind(&self.socket_path)?;
        info!("Listening on {}", self.socket_path.display());

        tokio::pin!(shutdown);
        let result = loop {
            let stream = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down...");
                    break Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) if is_transient(&e) => {
                        warn!("Accept error: {}", e);
                        continue;
                    }
                    Err(e) => {
                        error!("Listener failed: {}", e);
                        break Err(anyhow::Error::new(e).context("Failed to accept connection"));
                    }
                },
            };

            // Transcription has no time limit, so a signal must not wait for it
            tokio::select! {
                _ = self.serve_connection(stream) => {}
                _ = &mut shutdown => {
                    warn!("Shutting down with a request in flight, dropping it");
                    break Ok(());
                }
            }
        };

        self.daemon.shutdown().await;
        drop(listener);
        remove_socket(&self.socket_path);
        info!("Daemon stopped");

        result
    }

    async fn serve_connection(&self, mut stream: UnixStream) {
        let reply = match self.read_command(&mut stream).await {
            Some(command) => self.dispatch(command).await,
            None => Reply::InvalidCommand,
        };

        debug!("Replying: {}", reply);
        if let Err(e) = stream.write_all(reply.to_string().as_bytes()).await {
            warn!("Failed to send reply: {}", e);
        }
        if let Err(e) = stream.shutdown().await {
            debug!("Failed to close connection: {}", e);
        }
    }

    /// Single read of up to `MAX_COMMAND_BYTES`; `None` on timeout or read error
    async fn read_command(&self, stream: &mut UnixStream) -> Option<Command> {
        let mut buf = [0u8; MAX_COMMAND_BYTES];
        match tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) => {
                let command = Command::parse(&buf[..n]);
                info!("Received command: {}", command);
                Some(command)
            }
            Ok(Err(e)) => {
                warn!("Failed to read command: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Client sent nothing within {}ms",
                    self.read_timeout.as_millis()
                );
                None
            }
        }
    }

    /// Run the handler on its own task so neither errors nor panics reach the accept loop
    async fn dispatch(&self, command: Command) -> Reply {
        let daemon = Arc::clone(&self.daemon);
        let mut task = HandlerTask(tokio::spawn(async move { daemon.handle(command).await }));
        match (&mut task.0).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!("Error handling request: {:#}", e);
                Reply::Exception
            }
            Err(e) => {
                error!("Request handler panicked: {}", e);
                Reply::Exception
            }
        }
    }
}

/// Aborts the request handler when the connection is dropped mid-request,
/// which releases its capture and artifact
struct HandlerTask(JoinHandle<Result<Reply>>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn bind(socket_path: &Path) -> Result<UnixListener> {
    if let Some(dir) = socket_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    remove_socket(socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind {}", socket_path.display()))?;

    std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(SOCKET_MODE))
        .with_context(|| format!("Failed to set permissions on {}", socket_path.display()))?;

    Ok(listener)
}

fn remove_socket(socket_path: &Path) {
    match std::fs::remove_file(socket_path) {
        Ok(()) => debug!("Removed socket {}", socket_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove socket {}: {}", socket_path.display(), e),
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
}
