//! Diagnostics
//!
//! Line-level problems noticed while interpreting a file. They never stop a
//! pass; the processor collects them alongside the moves.

use std::fmt;

use serde::Serialize;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// A diagnostic attached to a 1-based line number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            line,
            message: message.into(),
            severity,
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self::new(line, message, Severity::Warning)
    }

    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self::new(line, message, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let warning = Diagnostic::warning(3, "bad parameter");
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.line, 3);

        let error = Diagnostic::error(7, String::from("unreadable"));
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.message, "unreadable");
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::warning(12, "unterminated comment");
        assert_eq!(diagnostic.to_string(), "line 12: warning: unterminated comment");
    }
}
