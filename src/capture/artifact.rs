use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Audio file produced by one capture
///
/// The file belongs to exactly one request and is deleted when the
/// `Artifact` is dropped, whatever the outcome of that request.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    /// Take ownership of `path`; the file is removed when this is dropped
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk, or `None` if the recorder never created the file
    pub fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Cleaned up: {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Cleanup error for {}: {}", self.path.display(), e),
        }
    }
}
