//! Reusable TUI components.

pub mod file_list;
