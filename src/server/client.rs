use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use super::protocol::{Command, Reply};

/// Send one command to a running daemon and wait for its reply
///
/// STOP blocks until transcription finishes.
pub async fn send(socket_path: &Path, command: Command) -> Result<Reply> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("Failed to connect to {}", socket_path.display()))?;

    stream
        .write_all(command.as_str().as_bytes())
        .await
        .context("Failed to send command")?;

    let mut reply = String::new();
    stream
        .read_to_string(&mut reply)
        .await
        .context("Failed to read reply")?;

    Ok(reply.parse::<Reply>()?)
}
