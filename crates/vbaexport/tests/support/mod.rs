//! In-memory stand-ins for the Excel object model.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use vbaexport::app::automation::{
    CodeModule, Component, ComponentCollection, Host, Project, Session,
};
use vbaexport::app::export::ModuleWriter;
use vbaexport::app::run::Picker;
use vbaexport::domain::errors::{AutomationError, FatalError, SessionStep, WriteError};
use vbaexport::domain::model::{CandidateFile, Selection};

pub const DOCUMENT: &str = "document";
pub const PROJECT: &str = "project";
pub const COMPONENTS: &str = "components";
pub const COMPONENT: &str = "component";
pub const CODE_MODULE: &str = "code_module";

/// Records every acquire/release and call made against the fakes.
#[derive(Debug, Default)]
pub struct Ledger {
    acquired: RefCell<BTreeMap<&'static str, usize>>,
    released: RefCell<BTreeMap<&'static str, usize>>,
    fetched: RefCell<Vec<usize>>,
    events: RefCell<Vec<String>>,
}

impl Ledger {
    pub fn acquired(&self, class: &str) -> usize {
        self.acquired.borrow().get(class).copied().unwrap_or(0)
    }

    pub fn released(&self, class: &str) -> usize {
        self.released.borrow().get(class).copied().unwrap_or(0)
    }

    pub fn fetched(&self) -> Vec<usize> {
        self.fetched.borrow().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn count_events(&self, event: &str) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }
}

fn acquire(ledger: &Rc<Ledger>, class: &'static str) -> Handle {
    *ledger.acquired.borrow_mut().entry(class).or_default() += 1;
    ledger.record(format!("acquire {class}"));
    Handle {
        class,
        ledger: Rc::clone(ledger),
    }
}

/// One reference to a fake automation object.
#[derive(Debug)]
pub struct Handle {
    class: &'static str,
    ledger: Rc<Ledger>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        *self
            .ledger
            .released
            .borrow_mut()
            .entry(self.class)
            .or_default() += 1;
        self.ledger.record(format!("release {}", self.class));
    }
}

/// Which call a fake component fails on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Fetch,
    Name,
    Kind,
    CodeModule,
    LineCount,
    Lines,
}

#[derive(Debug, Clone)]
pub struct FakeModule {
    pub name: String,
    pub kind: i32,
    pub lines: Vec<String>,
    pub failure: Option<Failure>,
}

impl FakeModule {
    pub fn new(name: &str, kind: i32, lines: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            lines: lines.iter().map(|line| (*line).to_owned()).collect(),
            failure: None,
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Text the host hands back for a full read: lines joined with CRLF.
    pub fn source(&self) -> String {
        self.lines.join("\r\n")
    }

    fn fails_at(&self, failure: Failure) -> bool {
        self.failure == Some(failure)
    }
}

fn call_failed(member: &str) -> AutomationError {
    AutomationError::Call {
        member: member.to_owned(),
        code: 0x800A_03EC,
        message: "simulated failure".to_owned(),
    }
}

#[derive(Debug, Default)]
pub struct FakeHost {
    modules: Rc<Vec<FakeModule>>,
    ledger: Rc<Ledger>,
    opened: RefCell<Vec<PathBuf>>,
    fail_open: bool,
    fail_project: bool,
    fail_count: bool,
}

impl FakeHost {
    pub fn new(modules: Vec<FakeModule>) -> Self {
        Self {
            modules: Rc::new(modules),
            ..Self::default()
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_project(mut self) -> Self {
        self.fail_project = true;
        self
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn ledger(&self) -> Rc<Ledger> {
        Rc::clone(&self.ledger)
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.borrow().clone()
    }
}

impl Host for FakeHost {
    type Session = FakeSession;

    fn open(&self, document: &Path) -> Result<FakeSession, FatalError> {
        self.opened.borrow_mut().push(document.to_path_buf());
        if self.fail_open {
            return Err(FatalError::new(
                SessionStep::OpenDocument,
                AutomationError::null("Open"),
            ));
        }
        Ok(FakeSession {
            modules: Rc::clone(&self.modules),
            fail_project: self.fail_project,
            fail_count: self.fail_count,
            closed: Cell::new(false),
            _document: acquire(&self.ledger, DOCUMENT),
            ledger: Rc::clone(&self.ledger),
        })
    }
}

#[derive(Debug)]
pub struct FakeSession {
    modules: Rc<Vec<FakeModule>>,
    fail_project: bool,
    fail_count: bool,
    closed: Cell<bool>,
    _document: Handle,
    ledger: Rc<Ledger>,
}

impl Session for FakeSession {
    type Project<'s> = FakeProject;

    fn project(&self) -> Result<FakeProject, AutomationError> {
        if self.fail_project {
            return Err(call_failed("VBProject"));
        }
        Ok(FakeProject {
            modules: Rc::clone(&self.modules),
            fail_count: self.fail_count,
            ledger: Rc::clone(&self.ledger),
            _handle: acquire(&self.ledger, PROJECT),
        })
    }

    fn close(self) -> Result<(), AutomationError> {
        self.ledger.record("close");
        self.closed.set(true);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.closed.get() {
            self.ledger.record("close on drop");
        }
    }
}

#[derive(Debug)]
pub struct FakeProject {
    modules: Rc<Vec<FakeModule>>,
    fail_count: bool,
    ledger: Rc<Ledger>,
    _handle: Handle,
}

impl Project for FakeProject {
    type Components<'p> = FakeComponents;

    fn components(&self) -> Result<FakeComponents, AutomationError> {
        Ok(FakeComponents {
            modules: Rc::clone(&self.modules),
            fail_count: self.fail_count,
            ledger: Rc::clone(&self.ledger),
            _handle: acquire(&self.ledger, COMPONENTS),
        })
    }
}

#[derive(Debug)]
pub struct FakeComponents {
    modules: Rc<Vec<FakeModule>>,
    fail_count: bool,
    ledger: Rc<Ledger>,
    _handle: Handle,
}

impl ComponentCollection for FakeComponents {
    type Component<'c> = FakeComponent;

    fn count(&self) -> Result<usize, AutomationError> {
        if self.fail_count {
            return Err(call_failed("Count"));
        }
        Ok(self.modules.len())
    }

    fn item(&self, index: usize) -> Result<FakeComponent, AutomationError> {
        self.ledger.fetched.borrow_mut().push(index);
        let module = index
            .checked_sub(1)
            .and_then(|idx| self.modules.get(idx))
            .ok_or_else(|| call_failed("Item"))?;
        if module.fails_at(Failure::Fetch) {
            return Err(call_failed("Item"));
        }
        Ok(FakeComponent {
            module: module.clone(),
            ledger: Rc::clone(&self.ledger),
            _handle: acquire(&self.ledger, COMPONENT),
        })
    }
}

#[derive(Debug)]
pub struct FakeComponent {
    module: FakeModule,
    ledger: Rc<Ledger>,
    _handle: Handle,
}

impl Component for FakeComponent {
    type Code<'m> = FakeCodeModule;

    fn name(&self) -> Result<String, AutomationError> {
        if self.module.fails_at(Failure::Name) {
            return Err(call_failed("Name"));
        }
        Ok(self.module.name.clone())
    }

    fn kind_code(&self) -> Result<i32, AutomationError> {
        if self.module.fails_at(Failure::Kind) {
            return Err(call_failed("Type"));
        }
        Ok(self.module.kind)
    }

    fn code_module(&self) -> Result<FakeCodeModule, AutomationError> {
        if self.module.fails_at(Failure::CodeModule) {
            return Err(AutomationError::null("CodeModule"));
        }
        Ok(FakeCodeModule {
            module: self.module.clone(),
            ledger: Rc::clone(&self.ledger),
            _handle: acquire(&self.ledger, CODE_MODULE),
        })
    }
}

#[derive(Debug)]
pub struct FakeCodeModule {
    module: FakeModule,
    ledger: Rc<Ledger>,
    _handle: Handle,
}

impl CodeModule for FakeCodeModule {
    fn line_count(&self) -> Result<usize, AutomationError> {
        if self.module.fails_at(Failure::LineCount) {
            return Err(call_failed("CountOfLines"));
        }
        Ok(self.module.lines.len())
    }

    fn lines(&self, start: usize, count: usize) -> Result<String, AutomationError> {
        self.ledger
            .record(format!("lines {} {start} {count}", self.module.name));
        if self.module.fails_at(Failure::Lines) {
            return Err(call_failed("Lines"));
        }
        let text = self
            .module
            .lines
            .iter()
            .skip(start.saturating_sub(1))
            .take(count)
            .cloned()
            .collect::<Vec<_>>()
            .join("\r\n");
        Ok(text)
    }
}

/// Keeps written modules in memory; optionally refuses one file name.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub files: BTreeMap<PathBuf, String>,
    pub writes: Vec<PathBuf>,
    reject: Option<String>,
}

impl MemoryWriter {
    pub fn rejecting(file_name: &str) -> Self {
        Self {
            reject: Some(file_name.to_owned()),
            ..Self::default()
        }
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .keys()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

impl ModuleWriter for MemoryWriter {
    fn write(&mut self, path: &Path, text: &str) -> Result<(), WriteError> {
        self.writes.push(path.to_path_buf());
        let rejected = self.reject.as_deref().is_some_and(|name| {
            path.file_name()
                .is_some_and(|file_name| file_name.to_string_lossy() == name)
        });
        if rejected {
            return Err(WriteError {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid file name"),
            });
        }
        self.files.insert(path.to_path_buf(), text.to_owned());
        Ok(())
    }
}

/// Picker that answers with a fixed selection.
#[derive(Debug)]
pub struct ScriptedPicker {
    answer: Selection,
    pub offered: Vec<Vec<String>>,
}

impl ScriptedPicker {
    pub fn choosing(index: usize) -> Self {
        Self {
            answer: Selection::Chosen(index),
            offered: Vec::new(),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            answer: Selection::Cancelled,
            offered: Vec::new(),
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick(&mut self, candidates: &[CandidateFile]) -> anyhow::Result<Selection> {
        self.offered
            .push(candidates.iter().map(|c| c.name.clone()).collect());
        Ok(self.answer)
    }
}
