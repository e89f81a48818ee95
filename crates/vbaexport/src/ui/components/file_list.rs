//! Workbook list component and selector state machine.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::domain::model::{CandidateFile, Selection};

const MARKER: &str = "▶ ";
const NO_MARKER: &str = "   ";

/// Where the selector is in its lifecycle. `Confirmed` and `Cancelled` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Browsing { cursor: usize },
    Confirmed(usize),
    Cancelled,
}

/// Candidate list plus the selector state driving it.
#[derive(Debug, Clone)]
pub struct FileListState {
    entries: Vec<CandidateFile>,
    state: SelectorState,
}

impl FileListState {
    /// Start browsing at the first entry.
    pub fn new(entries: &[CandidateFile]) -> Self {
        Self {
            entries: entries.to_vec(),
            state: SelectorState::Browsing { cursor: 0 },
        }
    }

    pub fn entries(&self) -> &[CandidateFile] {
        &self.entries
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Entry currently under the cursor (or the confirmed one).
    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            SelectorState::Browsing { cursor } | SelectorState::Confirmed(cursor) => Some(cursor),
            SelectorState::Cancelled => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, SelectorState::Browsing { .. })
    }

    /// The final answer once a terminal state has been reached.
    pub fn selection(&self) -> Option<Selection> {
        match self.state {
            SelectorState::Browsing { .. } => None,
            SelectorState::Confirmed(index) => Some(Selection::Chosen(index)),
            SelectorState::Cancelled => Some(Selection::Cancelled),
        }
    }

    pub fn move_up(&mut self) {
        if let SelectorState::Browsing { cursor } = &mut self.state {
            *cursor = cursor.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        let last = self.entries.len().saturating_sub(1);
        if let SelectorState::Browsing { cursor } = &mut self.state
            && *cursor < last
        {
            *cursor += 1;
        }
    }

    /// Accept the entry under the cursor. An empty list can only be cancelled.
    pub fn confirm(&mut self) {
        if let SelectorState::Browsing { cursor } = self.state {
            self.state = if self.entries.is_empty() {
                SelectorState::Cancelled
            } else {
                SelectorState::Confirmed(cursor)
            };
        }
    }

    pub fn cancel(&mut self) {
        if let SelectorState::Browsing { .. } = self.state {
            self.state = SelectorState::Cancelled;
        }
    }
}

/// Renders the candidate list with the cursor entry marked.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileList;

impl FileList {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &FileListState) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let block = Block::default()
            .title("Select the workbook to export macros from")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let cursor = state.cursor();
        let offset = local_offset();
        let items: Vec<ListItem<'_>> = state
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| build_list_item(entry, cursor == Some(idx), offset))
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, layout[0]);

        let hints = Paragraph::new(Line::from(vec![
            Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
            Span::raw(" move · "),
            Span::styled("enter", Style::default().fg(Color::Cyan)),
            Span::raw(" export · "),
            Span::styled("esc", Style::default().fg(Color::Cyan)),
            Span::raw(" cancel"),
        ]))
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, layout[1]);
    }
}

/// Plain text of a row: marker followed by the file name.
pub fn entry_label(entry: &CandidateFile, marked: bool) -> String {
    let prefix = if marked { MARKER } else { NO_MARKER };
    format!("{prefix}{}", entry.name)
}

fn build_list_item(entry: &CandidateFile, marked: bool, offset: UtcOffset) -> ListItem<'static> {
    let name_style = if marked {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::styled(entry_label(entry, marked), name_style)];
    if let Some(details) = entry_details(entry, offset) {
        spans.push(Span::styled(
            format!("  {details}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn entry_details(entry: &CandidateFile, offset: UtcOffset) -> Option<String> {
    let size = entry.size.map(format_size);
    let modified = entry.modified.and_then(|when| format_timestamp(when, offset));
    match (size, modified) {
        (Some(size), Some(modified)) => Some(format!("{size} · {modified}")),
        (Some(one), None) | (None, Some(one)) => Some(one),
        (None, None) => None,
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn format_timestamp(when: OffsetDateTime, offset: UtcOffset) -> Option<String> {
    when.to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .ok()
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
