//! Stand-in host for platforms without COM automation.

use std::convert::Infallible;
use std::path::Path;

use crate::app::automation::{CodeModule, Component, ComponentCollection, Host, Project, Session};
use crate::domain::errors::{AutomationError, FatalError, SessionStep};

/// Host that refuses to open sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedHost;

impl Host for UnsupportedHost {
    type Session = Never;

    fn open(&self, document: &Path) -> Result<Self::Session, FatalError> {
        tracing::error!(path = %document.display(), "Excel automation requires Windows");
        Err(FatalError::new(
            SessionStep::InitializeSubsystem,
            AutomationError::Unsupported,
        ))
    }
}

/// Uninhabited handle; no value of it can exist.
#[derive(Debug)]
pub struct Never(Infallible);

impl Session for Never {
    type Project<'s> = Never;

    fn project(&self) -> Result<Never, AutomationError> {
        match self.0 {}
    }

    fn close(self) -> Result<(), AutomationError> {
        match self.0 {}
    }
}

impl Project for Never {
    type Components<'p> = Never;

    fn components(&self) -> Result<Never, AutomationError> {
        match self.0 {}
    }
}

impl ComponentCollection for Never {
    type Component<'c> = Never;

    fn count(&self) -> Result<usize, AutomationError> {
        match self.0 {}
    }

    fn item(&self, _index: usize) -> Result<Never, AutomationError> {
        match self.0 {}
    }
}

impl Component for Never {
    type Code<'m> = Never;

    fn name(&self) -> Result<String, AutomationError> {
        match self.0 {}
    }

    fn kind_code(&self) -> Result<i32, AutomationError> {
        match self.0 {}
    }

    fn code_module(&self) -> Result<Never, AutomationError> {
        match self.0 {}
    }
}

impl CodeModule for Never {
    fn line_count(&self) -> Result<usize, AutomationError> {
        match self.0 {}
    }

    fn lines(&self, _start: usize, _count: usize) -> Result<String, AutomationError> {
        match self.0 {}
    }
}
