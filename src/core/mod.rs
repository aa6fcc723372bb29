//! Core types shared by the processor and the front end

pub mod diagnostics;

pub use diagnostics::{Diagnostic, Severity};
