//! Command server for key-binding clients
//!
//! One connection carries one command and one reply:
//! - `START` → `RECORDING_STARTED` / `ALREADY_RECORDING`
//! - `STOP` → transcribed text, or `ERROR:<reason>`
//! - anything else → `ERROR:INVALID_COMMAND`

pub mod client;
mod daemon;
mod listener;
mod protocol;

pub use daemon::Daemon;
pub use listener::{shutdown_signal, CommandServer};
pub use protocol::{Command, Reply, MAX_COMMAND_BYTES};
