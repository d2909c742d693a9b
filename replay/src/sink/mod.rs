//! Outputs of the pipeline and the sinks that receive them.

mod base;
pub mod memory;
pub mod stdout;

pub use base::{Diagnostic, DiagnosticKind, Output, Sink};
