//! A single export run: scan, pick, open, extract, close.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::automation::{Host, Session};
use crate::app::export::ModuleWriter;
use crate::app::extract::{ExtractionReport, extract};
use crate::app::scan::{Scanner, ScannerConfig};
use crate::domain::model::{CandidateFile, Selection};

/// Chooses which candidate to export.
pub trait Picker {
    fn pick(&mut self, candidates: &[CandidateFile]) -> Result<Selection>;
}

/// Inputs resolved before the run starts.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory scanned for workbooks.
    pub working_dir: PathBuf,
    /// Output directory; relative paths resolve against `working_dir`.
    pub output_dir: PathBuf,
    pub scanner: ScannerConfig,
}

#[derive(Debug)]
pub enum RunOutcome {
    Cancelled,
    Completed {
        document: PathBuf,
        output_dir: PathBuf,
        report: ExtractionReport,
    },
}

/// Drive one export end to end.
///
/// Selection happens before any automation object exists, so the automation
/// phase runs entirely on the calling thread once the picker returns.
pub fn run<H, P, W>(options: &RunOptions, host: &H, picker: &mut P, writer: &mut W) -> Result<RunOutcome>
where
    H: Host,
    P: Picker + ?Sized,
    W: ModuleWriter + ?Sized,
{
    let candidates = Scanner::new()
        .scan(&options.scanner)
        .context("nothing to export")?;

    let selected = match picker.pick(&candidates)? {
        Selection::Chosen(index) => candidates
            .get(index)
            .with_context(|| format!("selection {index} is out of range"))?,
        Selection::Cancelled => {
            tracing::debug!("selection cancelled");
            return Ok(RunOutcome::Cancelled);
        }
    };
    tracing::info!(path = %selected.full_path.display(), "selected workbook");

    let output_dir = resolve_output_dir(&options.working_dir, &options.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
    tracing::info!(path = %output_dir.display(), "output directory");

    let session = host.open(&selected.full_path)?;
    let report = extract(&session, &output_dir, writer)?;
    if let Err(err) = session.close() {
        tracing::warn!("host application did not shut down cleanly: {err}");
    }

    Ok(RunOutcome::Completed {
        document: selected.full_path.clone(),
        output_dir,
        report,
    })
}

fn resolve_output_dir(working_dir: &Path, output_dir: &Path) -> PathBuf {
    let joined = working_dir.join(output_dir);
    std::path::absolute(&joined).unwrap_or(joined)
}
