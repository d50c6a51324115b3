use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;


pub type EvalResult<T> = Result<T, BoiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Syntax,
    Shadowing,
    UnboundVariable,
    UndefinedFunction,
    UnbindMissing,
    ArityMismatch,
    RecursionLimit,
    MalformedProgram,
    InternalInvariant,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "Syntax",
            Self::Shadowing => "Shadowing",
            Self::UnboundVariable => "UnboundVariable",
            Self::UndefinedFunction => "UndefinedFunction",
            Self::UnbindMissing => "UnbindMissing",
            Self::ArityMismatch => "ArityMismatch",
            Self::RecursionLimit => "RecursionLimit",
            Self::MalformedProgram => "MalformedProgram",
            Self::InternalInvariant => "InternalInvariant",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure from parsing or evaluation.
///
/// Every kind except [ErrorKind::InternalInvariant] describes a problem in the
/// evaluated program. `InternalInvariant` means the evaluator itself broke a
/// contract and the host should stop.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {reason}")]
pub struct BoiError {
    kind: ErrorKind,
    reason: String,
    span: Span,
}

impl BoiError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>, span: Span) -> Self {
        Self { kind, reason: reason.into(), span }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::InternalInvariant
    }

    /// Multi-line diagnostic pointing at the offending source slice
    pub fn report(&self) -> String {
        let mut report = format!("Interpreter Error ({}): {}.", self.kind, self.reason);
        if !self.span.is_empty() {
            report.push_str(&format!(
                "\nnote: encountered error here ({}..{})\n{}",
                self.span.start(), self.span.end(), self.span.text()
            ));
        }
        report
    }

    pub(crate) fn syntax(reason: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, reason, span)
    }

    pub(crate) fn shadowing(reason: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Shadowing, reason, span)
    }

    pub(crate) fn unbind_missing(reason: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::UnbindMissing, reason, span)
    }

    pub(crate) fn malformed(reason: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::MalformedProgram, reason, span)
    }

    pub(crate) fn internal(reason: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::InternalInvariant, reason, span)
    }
}
