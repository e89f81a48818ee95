//! Seams over the host application's object model.
//!
//! Every handle type here owns exactly one reference to an automation object
//! and releases it when dropped, so early `continue`s and `?` returns in the
//! traversal cannot leak references. Child handles borrow their parent, so
//! none can outlive the session that produced it. Implementations live in
//! [`crate::infra::excel`]; tests substitute in-memory fakes.

use std::path::Path;

use crate::domain::errors::{AutomationError, FatalError};

/// Opens automation sessions against a document.
pub trait Host {
    type Session: Session;

    /// Start the host application and open `document` inside it.
    fn open(&self, document: &Path) -> Result<Self::Session, FatalError>;
}

/// An open document inside a hidden host instance.
///
/// Dropping a session without calling [`Session::close`] must still close the
/// document and quit the host.
///
/// A project borrows its session, so the session cannot be closed while the
/// project is still in use:
///
/// ```compile_fail
/// use vbaexport::app::automation::{Project, Session};
/// use vbaexport::domain::errors::AutomationError;
///
/// fn use_after_close<S: Session>(session: S) -> Result<(), AutomationError> {
///     let project = session.project()?;
///     session.close()?;
///     project.components()?;
///     Ok(())
/// }
/// ```
pub trait Session {
    type Project<'s>: Project
    where
        Self: 's;

    fn project(&self) -> Result<Self::Project<'_>, AutomationError>;

    /// Close the document without saving, quit the host and release everything.
    fn close(self) -> Result<(), AutomationError>;
}

/// The embedded VBA project of a document.
pub trait Project {
    type Components<'p>: ComponentCollection
    where
        Self: 'p;

    fn components(&self) -> Result<Self::Components<'_>, AutomationError>;
}

/// One-based collection of project components.
pub trait ComponentCollection {
    type Component<'c>: Component
    where
        Self: 'c;

    fn count(&self) -> Result<usize, AutomationError>;

    fn item(&self, index: usize) -> Result<Self::Component<'_>, AutomationError>;
}

pub trait Component {
    type Code<'m>: CodeModule
    where
        Self: 'm;

    fn name(&self) -> Result<String, AutomationError>;

    /// Raw `vbext_ComponentType` code.
    fn kind_code(&self) -> Result<i32, AutomationError>;

    fn code_module(&self) -> Result<Self::Code<'_>, AutomationError>;
}

/// Line-addressable source text of a component.
pub trait CodeModule {
    fn line_count(&self) -> Result<usize, AutomationError>;

    /// Read `count` lines starting at one-based line `start` in a single call.
    fn lines(&self, start: usize, count: usize) -> Result<String, AutomationError>;
}
