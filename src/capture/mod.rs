//! Capture control
//!
//! Launches the external recorder for a capture, stops it (graceful
//! interrupt first, forced kill after the grace period) and hands the
//! resulting artifact to the caller.

mod artifact;
mod controller;

pub use artifact::Artifact;
pub use controller::{ActiveCapture, CaptureController, FinishedCapture};
