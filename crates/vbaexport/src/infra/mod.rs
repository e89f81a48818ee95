//! Infrastructure adapters for the automation host, config, and logging.

pub mod config;
#[cfg(windows)]
pub mod com;
#[cfg(windows)]
pub mod excel;
pub mod logging;
pub mod unsupported;
