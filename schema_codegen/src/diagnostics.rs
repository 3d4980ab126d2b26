//! Diagnostic collection
//!
//! Every pipeline stage reports problems as [`Diagnostic`]s into a shared
//! [`Diagnostics`] collector. Errors abort the request; warnings are only
//! logged.

use serde::Serialize;
use std::fmt;

use crate::error::Error;

/// Message shown to callers in place of internal invariant failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error while generating source code";

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Which stage of the taxonomy a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Parse,
    TypeResolution,
    UnsupportedTarget,
    EmissionInvariant,
    LimitExceeded,
}

/// Where in the input a diagnostic points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub table: Option<String>,
    pub column: Option<String>,
    pub line: Option<usize>,
}

impl Location {
    pub fn table(table: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            ..Default::default()
        }
    }

    pub fn column(table: &str, column: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            column: Some(column.to_string()),
            line: None,
        }
    }

    pub fn line(line: usize) -> Self {
        Self {
            line: Some(line),
            ..Default::default()
        }
    }

    /// Attach a source line to the location
    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_none() && self.column.is_none() && self.line.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(line) = self.line {
            parts.push(format!("line {}", line));
        }
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => parts.push(format!("{}.{}", table, column)),
            (Some(table), None) => parts.push(table.clone()),
            (None, Some(column)) => parts.push(column.clone()),
            (None, None) => {}
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A single problem found while processing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            location,
        }
    }

    /// Replace the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Text shown to the caller.
    ///
    /// Invariant failures are configuration bugs; their detail stays in the log.
    pub fn user_message(&self) -> String {
        if self.kind == DiagnosticKind::EmissionInvariant {
            return INTERNAL_ERROR_MESSAGE.to_string();
        }
        if self.location.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.location, self.message)
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(error: &Error) -> Self {
        let (kind, message) = match error {
            Error::ParseError(msg) => (DiagnosticKind::Parse, msg.clone()),
            Error::TypeResolutionError(msg) => (DiagnosticKind::TypeResolution, msg.clone()),
            Error::UnsupportedTargetError(msg) => (DiagnosticKind::UnsupportedTarget, msg.clone()),
            Error::LimitExceededError(msg) => (DiagnosticKind::LimitExceeded, msg.clone()),
            other => (DiagnosticKind::EmissionInvariant, other.to_string()),
        };
        Diagnostic::error(kind, message, Location::default())
    }
}

/// Ordered collector for diagnostics of one request
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Location) {
        self.push(Diagnostic::error(kind, message, location));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Location) {
        self.push(Diagnostic::warning(kind, message, location));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Emit every warning through tracing
    pub fn log_warnings(&self) {
        for warning in self.warnings() {
            tracing::warn!(
                kind = ?warning.kind,
                location = %warning.location,
                "{}",
                warning.message
            );
        }
    }

    /// Drop warnings and keep errors in discovery order
    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.items.into_iter().filter(Diagnostic::is_error).collect()
    }
}

/// Render error diagnostics as the caller-facing message list
pub fn user_messages(errors: &[Diagnostic]) -> Vec<String> {
    errors.iter().map(Diagnostic::user_message).collect()
}
