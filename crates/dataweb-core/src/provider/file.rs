//! File-backed feed provider.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::FeedSnapshot;

use super::{FeedProvider, ProviderError};

/// Re-reads a feed JSON file on every fetch.
///
/// Useful for replaying a captured payload or for a feed written to disk
/// by another process.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedProvider for FileProvider {
    fn fetch(&mut self) -> Result<FeedSnapshot, ProviderError> {
        let bytes = fs::read(&self.path)
            .map_err(|e| ProviderError::Io(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "feed file read");
        Ok(FeedSnapshot::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
