// src/pipeline/artifact.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// A per-request file that is deleted when the guard drops, on success and
/// failure paths alike, unless `persist` is called first. Removal is
/// best-effort: failures are logged and never surfaced.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    keep: bool,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the file from cleanup and hands back its path.
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to remove temporary artifact: {}", e),
        }
    }
}
