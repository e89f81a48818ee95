//! Walking a VBA project and exporting each code-bearing component.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::app::automation::{CodeModule, Component, ComponentCollection, Project, Session};
use crate::app::export::ModuleWriter;
use crate::domain::errors::{AutomationError, FatalError, SessionStep, WriteError};
use crate::domain::model::{ComponentKind, ExtractedModule};

/// Point in the per-component pipeline where an item was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Fetch,
    Name,
    CodeModule,
    LineCount,
    ReadText,
    Write,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemStage::Fetch => "fetch component",
            ItemStage::Name => "read name",
            ItemStage::CodeModule => "acquire code module",
            ItemStage::LineCount => "read line count",
            ItemStage::ReadText => "read source text",
            ItemStage::Write => "write file",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Automation(#[from] AutomationError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result of processing one index of the component collection.
#[derive(Debug)]
pub enum ItemOutcome {
    Written {
        index: usize,
        name: String,
        kind: ComponentKind,
        path: PathBuf,
    },
    /// The component has no source lines; nothing was written.
    Empty { index: usize, name: String },
    Failed {
        index: usize,
        name: Option<String>,
        stage: ItemStage,
        error: ItemError,
    },
}

impl ItemOutcome {
    pub fn index(&self) -> usize {
        match self {
            ItemOutcome::Written { index, .. }
            | ItemOutcome::Empty { index, .. }
            | ItemOutcome::Failed { index, .. } => *index,
        }
    }
}

/// Two components that mapped to the same output file; the later write won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub path: PathBuf,
    pub earlier: String,
    pub later: String,
}

/// Per-item outcomes of one traversal, in collection order.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub items: Vec<ItemOutcome>,
    pub collisions: Vec<Collision>,
}

impl ExtractionReport {
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().filter_map(|item| match item {
            ItemOutcome::Written { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    pub fn empty_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ItemOutcome::Empty { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ItemOutcome::Failed { .. }))
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} written, {} empty, {} failed",
            self.written_count(),
            self.empty_count(),
            self.failed_count()
        )
    }
}

/// Export every non-empty component of the session's project into `output_dir`.
///
/// Only failures to reach the component collection are fatal; anything that
/// goes wrong with an individual component is recorded in the report and the
/// walk moves on to the next index.
pub fn extract<S, W>(
    session: &S,
    output_dir: &Path,
    writer: &mut W,
) -> Result<ExtractionReport, FatalError>
where
    S: Session,
    W: ModuleWriter + ?Sized,
{
    let project = session
        .project()
        .map_err(|err| FatalError::new(SessionStep::AcquireProject, err))?;
    let components = project
        .components()
        .map_err(|err| FatalError::new(SessionStep::AcquireComponents, err))?;
    let count = components
        .count()
        .map_err(|err| FatalError::new(SessionStep::ReadComponentCount, err))?;
    tracing::info!(count, "walking VBA components");

    let mut report = ExtractionReport::default();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();

    for index in 1..=count {
        let outcome = extract_item(&components, index, output_dir, writer);
        match &outcome {
            ItemOutcome::Written {
                name, kind, path, ..
            } => {
                tracing::info!(path = %path.display(), %kind, "exported {name}");
                if let Some(earlier) = claimed.insert(collision_key(path), name.clone()) {
                    tracing::warn!(
                        path = %path.display(),
                        "{name} overwrote the file previously written for {earlier}"
                    );
                    report.collisions.push(Collision {
                        path: path.clone(),
                        earlier,
                        later: name.clone(),
                    });
                }
            }
            ItemOutcome::Empty { name, .. } => {
                tracing::debug!(index, "skipping {name}: no source lines");
            }
            ItemOutcome::Failed {
                name, stage, error, ..
            } => {
                tracing::warn!(
                    index,
                    component = name.as_deref().unwrap_or("?"),
                    "failed to {stage}: {error}"
                );
            }
        }
        report.items.push(outcome);
    }

    Ok(report)
}

/// Path identity as the output filesystem sees it.
fn collision_key(path: &Path) -> PathBuf {
    if cfg!(any(windows, target_os = "macos")) {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path.to_path_buf()
    }
}

fn extract_item<C, W>(
    components: &C,
    index: usize,
    output_dir: &Path,
    writer: &mut W,
) -> ItemOutcome
where
    C: ComponentCollection,
    W: ModuleWriter + ?Sized,
{
    let failed = |name: Option<&str>, stage, error: ItemError| ItemOutcome::Failed {
        index,
        name: name.map(str::to_owned),
        stage,
        error,
    };

    let component = match components.item(index) {
        Ok(component) => component,
        Err(err) => return failed(None, ItemStage::Fetch, err.into()),
    };
    let name = match component.name() {
        Ok(name) => name,
        Err(err) => return failed(None, ItemStage::Name, err.into()),
    };
    let kind = match component.kind_code() {
        Ok(code) => ComponentKind::from_code(code),
        Err(err) => {
            tracing::warn!(index, "could not read the type of {name}, using .vbs: {err}");
            ComponentKind::Other
        }
    };

    // Declared after `component`, so it is released first.
    let code = match component.code_module() {
        Ok(code) => code,
        Err(err) => return failed(Some(&name), ItemStage::CodeModule, err.into()),
    };
    let lines = match code.line_count() {
        Ok(lines) => lines,
        Err(err) => return failed(Some(&name), ItemStage::LineCount, err.into()),
    };
    if lines == 0 {
        return ItemOutcome::Empty { index, name };
    }
    let source_text = match code.lines(1, lines) {
        Ok(text) => text,
        Err(err) => return failed(Some(&name), ItemStage::ReadText, err.into()),
    };

    let module = ExtractedModule {
        output_path: output_dir.join(ExtractedModule::file_name(&name, kind)),
        name,
        kind,
        source_text,
    };
    match writer.write(&module.output_path, &module.source_text) {
        Ok(()) => ItemOutcome::Written {
            index,
            name: module.name,
            kind,
            path: module.output_path,
        },
        Err(err) => failed(Some(&module.name), ItemStage::Write, err.into()),
    }
}
