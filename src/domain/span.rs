//! Located diagnostics as reported by patsopt.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Diagnostic severity; anything unknown is kept literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Other(String),
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            other => Severity::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Other(label) => write!(f, "{}", label),
        }
    }
}

/// One end of a span: 1-based byte offset plus line/column coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub byte: usize,
    pub line: usize,
    pub offset: usize,
}

/// A diagnostic pointing into a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSpan {
    pub file: PathBuf,
    pub start: Position,
    pub end: Position,
    pub severity: Severity,
    pub id: String,
    pub description: String,
}

impl DiagnosticSpan {
    pub fn is_multiline(&self) -> bool {
        self.start.line != self.end.line
    }

    /// Identifiers are worth showing only when symbolic.
    pub fn has_symbolic_id(&self) -> bool {
        !self.id.is_empty() && !self.id.chars().all(|c| c.is_ascii_digit())
    }

    /// Description without one trailing ':' or '.'.
    pub fn trimmed_description(&self) -> &str {
        self.description
            .strip_suffix([':', '.'])
            .unwrap_or(&self.description)
    }
}
