//! Working directory scanning for macro-enabled workbooks.

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::domain::errors::ScanError;
use crate::domain::model::CandidateFile;
use crate::infra::config::Config;

/// Prefix Excel uses for the owner file of a workbook that is currently open.
const OWNER_FILE_PREFIX: &str = "~$";

/// Configuration inputs for the scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub root: PathBuf,
    pub extension: String,
}

impl ScannerConfig {
    pub fn from_root(root: PathBuf, config: &Config) -> Self {
        Self {
            root,
            extension: config.scan.extension(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Lists workbooks directly inside a directory, without recursing.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Collect matching files ordered by name; an empty result is an error.
    pub fn scan(&self, cfg: &ScannerConfig) -> Result<Vec<CandidateFile>, ScanError> {
        let read_err = |source| ScanError::ReadDir {
            dir: cfg.root.clone(),
            source,
        };
        let wanted = cfg.extension.trim_start_matches('.');

        let mut files = Vec::new();
        for entry in fs::read_dir(&cfg.root).map_err(read_err)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with(OWNER_FILE_PREFIX) || !has_extension(&path, wanted) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(CandidateFile {
                name,
                full_path: absolute(&cfg.root).join(entry.file_name()),
                size: Some(metadata.len()),
                modified: metadata.modified().ok().map(OffsetDateTime::from),
            });
        }

        if files.is_empty() {
            return Err(ScanError::NoCandidates {
                dir: cfg.root.clone(),
                extension: wanted.to_owned(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

fn absolute(root: &Path) -> PathBuf {
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}
