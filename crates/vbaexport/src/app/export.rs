//! Persisting extracted modules to disk.

use std::fs;
use std::path::Path;

use crate::domain::errors::WriteError;

/// Destination for extracted module text.
pub trait ModuleWriter {
    /// Replace the contents of `path` with `text`.
    fn write(&mut self, path: &Path, text: &str) -> Result<(), WriteError>;
}

/// Writes modules as plain files. Parent directories must already exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWriter;

impl FileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleWriter for FileWriter {
    fn write(&mut self, path: &Path, text: &str) -> Result<(), WriteError> {
        fs::write(path, text.as_bytes()).map_err(|source| WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "module written");
        Ok(())
    }
}
