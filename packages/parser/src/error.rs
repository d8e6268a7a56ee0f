//! Error types for the Livemark parser

use crate::ast::Span;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with location and context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { span: Span, expected: String },

    #[error("{message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("Unexpected character `{found}`")]
    LexerError { span: Span, found: String },

    #[error("Unterminated code fence: expected a closing `{fence}` before the end of the document")]
    UnterminatedFence { span: Span, fence: String },

    #[error("Expected a closing tag for `<{name}>` before the end of the {context}")]
    UnterminatedComponent {
        span: Span,
        name: String,
        context: String,
    },

    #[error("Expected a closing tag for `<{expected}>`, found `</{found}>`")]
    MismatchedClosingTag {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected closing tag `</{name}>`, there is no matching opening tag")]
    UnexpectedClosingTag { span: Span, name: String },

    #[error("Unexpected end of input in tag `<{name}`, expected `>` or `/>`")]
    UnterminatedTag { span: Span, name: String },

    #[error("Unterminated string, expected a closing `{quote}`")]
    UnterminatedString { span: Span, quote: char },

    #[error("Unterminated expression, expected a closing `}}`")]
    UnterminatedExpression { span: Span },

    #[error("Unterminated comment, expected a closing `*/`")]
    UnterminatedComment { span: Span },

    #[error("Nesting is deeper than {limit} levels")]
    NestingTooDeep { span: Span, limit: usize },
}

impl ParseError {
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(span: Span, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            span,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn lexer_error(span: Span, found: impl Into<String>) -> Self {
        Self::LexerError {
            span,
            found: found.into(),
        }
    }

    pub fn unterminated_component(span: Span, name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnterminatedComponent {
            span,
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexerError { span, .. }
            | ParseError::UnterminatedFence { span, .. }
            | ParseError::UnterminatedComponent { span, .. }
            | ParseError::MismatchedClosingTag { span, .. }
            | ParseError::UnexpectedClosingTag { span, .. }
            | ParseError::UnterminatedTag { span, .. }
            | ParseError::UnterminatedString { span, .. }
            | ParseError::UnterminatedExpression { span }
            | ParseError::UnterminatedComment { span }
            | ParseError::NestingTooDeep { span, .. } => *span,
        }
    }

    /// Short label for the highlighted source range
    pub fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } | ParseError::UnexpectedEof { expected, .. } => {
                format!("expected {}", expected)
            }
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::LexerError { .. } => "not valid here".to_string(),
            ParseError::UnterminatedFence { .. } => "fence opened here".to_string(),
            ParseError::UnterminatedComponent { name, .. } => format!("`<{}>` opened here", name),
            ParseError::MismatchedClosingTag { expected, .. } => format!("expected `</{}>`", expected),
            ParseError::UnexpectedClosingTag { .. } => "no matching opening tag".to_string(),
            ParseError::UnterminatedTag { .. } => "tag opened here".to_string(),
            ParseError::UnterminatedString { .. } => "string starts here".to_string(),
            ParseError::UnterminatedExpression { .. } => "expression starts here".to_string(),
            ParseError::UnterminatedComment { .. } => "comment starts here".to_string(),
            ParseError::NestingTooDeep { .. } => "too deeply nested".to_string(),
        }
    }

    /// Shift every span by `offset` (used when a nested container was parsed from a copy)
    pub(crate) fn offset_by(mut self, offset: usize) -> Self {
        let span = match &mut self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexerError { span, .. }
            | ParseError::UnterminatedFence { span, .. }
            | ParseError::UnterminatedComponent { span, .. }
            | ParseError::MismatchedClosingTag { span, .. }
            | ParseError::UnexpectedClosingTag { span, .. }
            | ParseError::UnterminatedTag { span, .. }
            | ParseError::UnterminatedString { span, .. }
            | ParseError::UnterminatedExpression { span }
            | ParseError::UnterminatedComment { span }
            | ParseError::NestingTooDeep { span, .. } => span,
        };
        span.start += offset;
        span.end += offset;
        self
    }
}

/// 1-based line and column of a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// Pretty-print errors with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub mod pretty {
    use super::ParseError;
    use ariadne::{Color, Label, Report, ReportKind, Source};

    /// Render a message plus span as an ariadne report
    pub fn format_message(message: &str, label: &str, span: std::ops::Range<usize>, filename: &str, source: &str) -> String {
        // ariadne counts chars, spans are bytes
        let to_char = |byte: usize| {
            source
                .get(..byte.min(source.len()))
                .map(|prefix| prefix.chars().count())
                .unwrap_or(byte)
        };
        let start = to_char(span.start);
        let end = to_char(span.end).max(start);

        let report = Report::build(ReportKind::Error, filename, start)
            .with_message(message)
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(label),
            )
            .finish();

        let mut output = Vec::new();
        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            return message.to_string();
        }

        String::from_utf8(output).unwrap_or_else(|_| message.to_string())
    }

    pub fn format_error(error: &ParseError, filename: &str, source: &str) -> String {
        let span = error.span();
        format_message(&error.to_string(), &error.label(), span.start..span.end, filename, source)
    }
}
