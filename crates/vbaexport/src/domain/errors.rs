//! Domain-specific errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A failed call against the host application's object model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AutomationError {
    #[error("{member} failed: {message} (HRESULT {code:#010x})")]
    Call {
        member: String,
        code: u32,
        message: String,
    },
    #[error("{member} returned an empty handle")]
    Null { member: String },
    #[error("{member} returned a value that could not be converted: {message}")]
    Conversion { member: String, message: String },
    #[error("automation is not available on this platform")]
    Unsupported,
}

impl AutomationError {
    pub fn null(member: impl Into<String>) -> Self {
        AutomationError::Null {
            member: member.into(),
        }
    }
}

/// Step of session setup or project traversal whose failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    InitializeSubsystem,
    CreateApplication,
    AcquireDispatch,
    ConfigureApplication,
    AcquireWorkbooks,
    OpenDocument,
    AcquireProject,
    AcquireComponents,
    ReadComponentCount,
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStep::InitializeSubsystem => "initializing COM",
            SessionStep::CreateApplication => "creating the Excel application",
            SessionStep::AcquireDispatch => "querying IDispatch on the application",
            SessionStep::ConfigureApplication => "configuring the application",
            SessionStep::AcquireWorkbooks => "acquiring Workbooks",
            SessionStep::OpenDocument => "opening the workbook",
            SessionStep::AcquireProject => "acquiring VBProject",
            SessionStep::AcquireComponents => "acquiring VBComponents",
            SessionStep::ReadComponentCount => "reading the component count",
        };
        f.write_str(label)
    }
}

/// Unrecoverable automation failure; the run stops after reporting it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step} failed")]
pub struct FatalError {
    pub step: SessionStep,
    #[source]
    pub source: AutomationError,
}

impl FatalError {
    pub fn new(step: SessionStep, source: AutomationError) -> Self {
        Self { step, source }
    }

    /// Extra guidance for failures with a well-known cause.
    pub fn hint(&self) -> Option<&'static str> {
        match self.step {
            SessionStep::AcquireProject => Some(
                "enable \"Trust access to the VBA project object model\" in Excel's Trust Center",
            ),
            SessionStep::CreateApplication => Some("is Excel installed for this user?"),
            _ => None,
        }
    }
}

/// Failure to persist one extracted module.
#[derive(Debug, Error)]
#[error("failed to write {}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors raised while looking for input workbooks.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no .{extension} files found in {}", dir.display())]
    NoCandidates { dir: PathBuf, extension: String },
    #[error("failed to read directory {}", dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}
