pub mod backend;
pub mod file;

pub use backend::{CaptureBackend, PwRecordBackend};
pub use file::AudioFile;
