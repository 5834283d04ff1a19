//! Recording session management
//!
//! This module provides the session record and the state machine that
//! drives it:
//! - IDLE → RECORDING on START (one capture at a time)
//! - RECORDING → IDLE on STOP, handing the finished capture to the caller
//! - forced return to IDLE on shutdown

mod machine;
mod session;
mod stats;

pub use machine::{BeginOutcome, EndError, SessionMachine};
pub use session::Session;
pub use stats::SessionSnapshot;
