//! Application layer: discovery, selection and module extraction.

pub mod automation;
pub mod export;
pub mod extract;
pub mod run;
pub mod scan;
