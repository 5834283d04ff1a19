pub mod audio;
pub mod capture;
pub mod clip;
pub mod config;
pub mod server;
pub mod session;
pub mod transcription;

pub use audio::{AudioFile, CaptureBackend, PwRecordBackend};
pub use capture::{ActiveCapture, Artifact, CaptureController, FinishedCapture};
pub use clip::{ClipPolicy, ClipVerdict};
pub use config::Config;
pub use server::{Command, CommandServer, Daemon, Reply};
pub use session::{BeginOutcome, EndError, SessionMachine, SessionSnapshot};
pub use transcription::{Segment, SpeechEngine, Transcriber, TranscriptionFailure};
