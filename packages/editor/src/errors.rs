//! Error types for the compile pipeline

use livemark_evaluator::{EvalError, ModuleError};
use livemark_parser::{line_col, ParseError, Span};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

/// Stage of the pipeline a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Document structure could not be parsed
    Parse,
    /// An expression or export could not be compiled
    Syntax,
    /// Evaluation failed while building the tree
    Runtime,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Syntax => write!(f, "syntax"),
            ErrorKind::Runtime => write!(f, "runtime"),
        }
    }
}

/// Structured compilation failure shown in place of the preview
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Message prefixed with `line:column:` when the location is known
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Error located in `source`; the message gets a `line:column:` prefix
    pub fn located(kind: ErrorKind, message: impl std::fmt::Display, span: Span, source: &str) -> Self {
        let (line, column) = line_col(source, span.start);
        Self::new(kind, format!("{}:{}: {}", line, column, message), Some(span))
    }

    /// A compile task that panicked
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(ErrorKind::Runtime, format!("Compilation panicked: {}", detail), None)
    }

    /// A compile task that was cancelled before finishing
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Runtime, "Compilation was cancelled", None)
    }

    pub fn is_parse(&self) -> bool {
        self.kind == ErrorKind::Parse
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    pub fn is_runtime(&self) -> bool {
        self.kind == ErrorKind::Runtime
    }
}

/// Failure of one pipeline stage, before it is located in the source
#[derive(Error, Debug)]
pub(crate) enum StageError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Module(#[from] ModuleError),

    #[error("{0}")]
    Eval(#[from] EvalError),
}

impl StageError {
    pub(crate) fn locate(self, source: &str) -> CompileError {
        match self {
            StageError::Parse(err) => CompileError::located(ErrorKind::Parse, &err, err.span(), source),
            StageError::Module(err) => CompileError::located(ErrorKind::Syntax, &err, err.span(), source),
            StageError::Eval(err) => CompileError::located(ErrorKind::Runtime, &err, err.span(), source),
        }
    }
}
