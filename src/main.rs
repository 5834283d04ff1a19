use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use speech_daemon::config::DEFAULT_CONFIG_PATH;
use speech_daemon::server::{client, shutdown_signal};
use speech_daemon::{Command, CommandServer, Config, Daemon};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "speech-daemon", version, about = "Hold-to-talk speech-to-text daemon")]
struct Cli {
    /// Config file (extension optional); defaults are used when absent
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Run the daemon (default)
    Serve,
    /// Ask a running daemon to start recording
    Start,
    /// Ask a running daemon to stop recording and print the transcript
    Stop,
}

/// How long exit waits for a transcription still running on a blocking thread
const BLOCKING_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::load(path, true)?,
        None => Config::load(DEFAULT_CONFIG_PATH, false)?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let result = runtime.block_on(async {
        match cli.command.unwrap_or(Action::Serve) {
            Action::Serve => serve(cfg).await,
            Action::Start => request(&cfg, Command::Start).await,
            Action::Stop => request(&cfg, Command::Stop).await,
        }
    });

    // A hung speech engine must not keep the process alive after shutdown
    runtime.shutdown_timeout(BLOCKING_SHUTDOWN_TIMEOUT);
    result
}

async fn serve(cfg: Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let daemon = Arc::new(Daemon::from_config(&cfg)?);
    let server = CommandServer::new(
        cfg.service.socket_path.clone(),
        Duration::from_millis(cfg.service.read_timeout_ms),
        daemon,
    );

    server.run(shutdown_signal()).await
}

async fn request(cfg: &Config, command: Command) -> Result<()> {
    let reply = client::send(&cfg.service.socket_path, command).await?;
    println!("{}", reply);

    if reply.is_error() {
        std::process::exit(1);
    }
    Ok(())
}
