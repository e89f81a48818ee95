//! Excel automation backend.

use std::marker::PhantomData;
use std::path::Path;

use windows::core::{BSTR, IUnknown, VARIANT};

use crate::app::automation::{CodeModule, Component, ComponentCollection, Host, Project, Session};
use crate::domain::errors::{AutomationError, FatalError, SessionStep};
use crate::infra::com::{Apartment, Dispatch};
use crate::infra::config::Config;

/// Starts hidden Excel instances through `IDispatch`.
#[derive(Debug, Clone)]
pub struct ExcelHost {
    prog_id: String,
    automation_security: i32,
}

impl ExcelHost {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prog_id: config.host.prog_id(),
            automation_security: config.host.automation_security(),
        }
    }

    fn configure(&self, application: &Dispatch) -> Result<(), AutomationError> {
        application.put("Visible", VARIANT::from(false))?;
        application.put("EnableEvents", VARIANT::from(false))?;
        application.put("DisplayAlerts", VARIANT::from(false))?;
        application.put("AutomationSecurity", VARIANT::from(self.automation_security))?;
        Ok(())
    }
}

impl Host for ExcelHost {
    type Session = ExcelSession;

    fn open(&self, document: &Path) -> Result<ExcelSession, FatalError> {
        let fatal = |step| move |err| FatalError::new(step, err);

        let apartment = Apartment::initialize().map_err(fatal(SessionStep::InitializeSubsystem))?;
        let instance = apartment
            .create_instance(&self.prog_id)
            .map_err(fatal(SessionStep::CreateApplication))?;
        let application =
            Dispatch::from_unknown(&instance).map_err(fatal(SessionStep::AcquireDispatch))?;
        tracing::debug!(prog_id = %self.prog_id, "host application started");

        self.configure(&application)
            .map_err(fatal(SessionStep::ConfigureApplication))?;
        let workbooks = application
            .get_object("Workbooks", &[])
            .map_err(fatal(SessionStep::AcquireWorkbooks))?;
        let path = BSTR::from(document.to_string_lossy().as_ref());
        let workbook = workbooks
            .call_object("Open", &[VARIANT::from(path)])
            .map_err(fatal(SessionStep::OpenDocument))?;
        tracing::info!(path = %document.display(), "workbook opened");

        Ok(ExcelSession {
            workbook: Some(workbook),
            workbooks: Some(workbooks),
            application: Some(application),
            instance: Some(instance),
            _apartment: apartment,
        })
    }
}

/// An open workbook inside a hidden Excel instance.
///
/// Handles are released newest first; the apartment field is declared last
/// so COM is uninitialized only after every interface is gone.
#[derive(Debug)]
pub struct ExcelSession {
    workbook: Option<Dispatch>,
    workbooks: Option<Dispatch>,
    application: Option<Dispatch>,
    instance: Option<IUnknown>,
    _apartment: Apartment,
}

impl ExcelSession {
    fn shutdown(&mut self) -> Result<(), AutomationError> {
        let mut first_error = None;

        if let Some(workbook) = self.workbook.take() {
            if let Err(err) = workbook.call("Close", &[VARIANT::from(false)]) {
                tracing::warn!("closing the workbook failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        self.workbooks.take();

        if let Some(application) = self.application.take() {
            if let Err(err) = application.call("Quit", &[]) {
                tracing::warn!("quitting the host application failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        self.instance.take();

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Session for ExcelSession {
    type Project<'s> = ExcelProject<'s>;

    fn project(&self) -> Result<ExcelProject<'_>, AutomationError> {
        let workbook = self
            .workbook
            .as_ref()
            .ok_or_else(|| AutomationError::null("Workbook"))?;
        workbook
            .get_object("VBProject", &[])
            .map(|dispatch| ExcelProject(Handle::new(dispatch)))
    }

    fn close(mut self) -> Result<(), AutomationError> {
        let result = self.shutdown();
        tracing::info!("host application closed");
        result
    }
}

impl Drop for ExcelSession {
    fn drop(&mut self) {
        // Nothing left to do after an explicit `close`.
        if self.workbook.is_some() || self.application.is_some() {
            let _ = self.shutdown();
        }
    }
}

/// A dispatch reference that cannot outlive the object it was obtained from.
#[derive(Debug)]
struct Handle<'a> {
    dispatch: Dispatch,
    _parent: PhantomData<&'a ()>,
}

impl Handle<'_> {
    fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            _parent: PhantomData,
        }
    }
}

#[derive(Debug)]
pub struct ExcelProject<'s>(Handle<'s>);

impl Project for ExcelProject<'_> {
    type Components<'p>
        = ExcelComponents<'p>
    where
        Self: 'p;

    fn components(&self) -> Result<ExcelComponents<'_>, AutomationError> {
        self.0
            .dispatch
            .get_object("VBComponents", &[])
            .map(|dispatch| ExcelComponents(Handle::new(dispatch)))
    }
}

#[derive(Debug)]
pub struct ExcelComponents<'p>(Handle<'p>);

impl ComponentCollection for ExcelComponents<'_> {
    type Component<'c>
        = ExcelComponent<'c>
    where
        Self: 'c;

    fn count(&self) -> Result<usize, AutomationError> {
        let count = self.0.dispatch.get_i32("Count")?;
        non_negative("Count", count)
    }

    fn item(&self, index: usize) -> Result<ExcelComponent<'_>, AutomationError> {
        let index = to_i32("Item", index)?;
        self.0
            .dispatch
            .call_object("Item", &[VARIANT::from(index)])
            .map(|dispatch| ExcelComponent(Handle::new(dispatch)))
    }
}

#[derive(Debug)]
pub struct ExcelComponent<'c>(Handle<'c>);

impl Component for ExcelComponent<'_> {
    type Code<'m>
        = ExcelCodeModule<'m>
    where
        Self: 'm;

    fn name(&self) -> Result<String, AutomationError> {
        self.0.dispatch.get_string("Name", &[])
    }

    fn kind_code(&self) -> Result<i32, AutomationError> {
        self.0.dispatch.get_i32("Type")
    }

    fn code_module(&self) -> Result<ExcelCodeModule<'_>, AutomationError> {
        self.0
            .dispatch
            .get_object("CodeModule", &[])
            .map(|dispatch| ExcelCodeModule(Handle::new(dispatch)))
    }
}

#[derive(Debug)]
pub struct ExcelCodeModule<'m>(Handle<'m>);

impl CodeModule for ExcelCodeModule<'_> {
    fn line_count(&self) -> Result<usize, AutomationError> {
        let lines = self.0.dispatch.get_i32("CountOfLines")?;
        non_negative("CountOfLines", lines)
    }

    fn lines(&self, start: usize, count: usize) -> Result<String, AutomationError> {
        let args = [
            VARIANT::from(to_i32("Lines", start)?),
            VARIANT::from(to_i32("Lines", count)?),
        ];
        self.0.dispatch.get_string("Lines", &args)
    }
}

fn non_negative(member: &str, value: i32) -> Result<usize, AutomationError> {
    usize::try_from(value).map_err(|_| AutomationError::Conversion {
        member: member.to_owned(),
        message: format!("negative value {value}"),
    })
}

fn to_i32(member: &str, value: usize) -> Result<i32, AutomationError> {
    i32::try_from(value).map_err(|_| AutomationError::Conversion {
        member: member.to_owned(),
        message: format!("{value} does not fit in a 32-bit argument"),
    })
}
