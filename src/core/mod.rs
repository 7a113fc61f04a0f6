//! Core types shared by the analyzer, repair engine and controller.

mod diagnostic;
mod error;
pub mod progress;

pub use diagnostic::{total_cost, Diagnostic, DiagnosticKind, Dim, StyleRule};
pub use error::{Error, Result};
