//! Event loop for the workbook selector.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use thiserror::Error;

use crate::app::run::Picker;
use crate::domain::model::{CandidateFile, Selection};
use crate::infra::config::{Config, Keybindings};
use crate::ui::components::file_list::{FileList, FileListState};

const TICK_RATE: Duration = Duration::from_millis(120);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown key '{0}' in keybindings")]
    UnknownKey(String),
}

/// Parse a key name from the config (`"k"`, `"enter"`, `"esc"`, ...).
pub fn parse_key(raw: &str) -> Result<KeyCode, KeyParseError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(ch));
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        "tab" => Ok(KeyCode::Tab),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "pageup" => Ok(KeyCode::PageUp),
        "pagedown" => Ok(KeyCode::PageDown),
        _ => Err(KeyParseError::UnknownKey(raw.to_owned())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Up,
    Down,
    Confirm,
    Cancel,
}

/// Keys driving the selector; arrows and `esc` always work on top of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    up: KeyCode,
    down: KeyCode,
    confirm: KeyCode,
    cancel: KeyCode,
}

impl KeyMap {
    pub fn from_bindings(bindings: &Keybindings) -> Result<Self, KeyParseError> {
        Ok(Self {
            up: parse_key(bindings.up())?,
            down: parse_key(bindings.down())?,
            confirm: parse_key(bindings.confirm())?,
            cancel: parse_key(bindings.cancel())?,
        })
    }

    fn action(&self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c')).then_some(Action::Cancel);
        }
        match key.code {
            KeyCode::Up => Some(Action::Up),
            KeyCode::Down => Some(Action::Down),
            KeyCode::Esc => Some(Action::Cancel),
            code if code == self.up => Some(Action::Up),
            code if code == self.down => Some(Action::Down),
            code if code == self.confirm => Some(Action::Confirm),
            code if code == self.cancel => Some(Action::Cancel),
            _ => None,
        }
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            up: KeyCode::Char('k'),
            down: KeyCode::Char('j'),
            confirm: KeyCode::Enter,
            cancel: KeyCode::Char('q'),
        }
    }
}

/// Full-screen picker for the workbook to export.
#[derive(Debug, Default)]
pub struct SelectorApp {
    keys: KeyMap,
    list: FileList,
}

impl SelectorApp {
    pub fn from_config(config: &Config) -> Result<Self> {
        let keys = KeyMap::from_bindings(&config.keybindings).context("invalid keybindings")?;
        Ok(Self {
            keys,
            list: FileList,
        })
    }

    /// Show the list until the user confirms or cancels.
    ///
    /// The terminal is restored before returning, whatever the outcome.
    pub fn run(&mut self, candidates: &[CandidateFile]) -> Result<Selection> {
        let mut state = FileListState::new(candidates);

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            disable_raw_mode().ok();
            return Err(err).context("failed to enter alternate screen");
        }

        let backend = CrosstermBackend::new(stdout);
        let event_loop_result = Terminal::new(backend)
            .context("failed to initialize terminal")
            .and_then(|mut terminal| {
                terminal.hide_cursor().ok();
                let result = self.event_loop(&mut terminal, &mut state);
                let _ = terminal.show_cursor();
                result
            });

        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);

        event_loop_result?;
        Ok(state.selection().unwrap_or(Selection::Cancelled))
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        state: &mut FileListState,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame, state))?;

            if state.is_finished() {
                break;
            }

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(state, key);
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>, state: &FileListState) {
        let area = frame.size();
        self.list.render(frame, area, state);
    }

    /// Apply one key press to the selector state.
    pub fn handle_key(&self, state: &mut FileListState, key: KeyEvent) {
        match self.keys.action(key) {
            Some(Action::Up) => state.move_up(),
            Some(Action::Down) => state.move_down(),
            Some(Action::Confirm) => state.confirm(),
            Some(Action::Cancel) => state.cancel(),
            None => {}
        }
    }
}

impl Picker for SelectorApp {
    fn pick(&mut self, candidates: &[CandidateFile]) -> Result<Selection> {
        self.run(candidates)
    }
}
