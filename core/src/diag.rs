use std::fmt;

use serde::Serialize;

use crate::token::Span;

/// Analysis error taxonomy. Every variant is recovered locally; the
/// pipeline never aborts a whole-document analysis over one bad line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Malformed token, recovered at the next line.
    LexError,
    /// Unparseable statement shape, recovered at the next statement.
    SyntaxError,
    /// Unrecognized command, function, or special variable.
    UnknownSymbol,
    /// Naked global reference with no prior global in routine scope.
    UnresolvedNakedReference,
    /// Duplicate label declaration in one document.
    AmbiguousLabel,
    /// Label call whose argument count differs from the declared
    /// parameter list.
    ArityMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}
