//! Weft error handling.
//!
//! Inside the combinator machinery failures are plain values
//! ([`ParseResult::Failure`](crate::state::ParseResult)). They only become a
//! [`WeftError`] at the top-level `parse` boundary, or when a grammar cannot be
//! built at all (an invalid regex pattern, for instance).
//!
//! `WeftError` derives its message through `thiserror` and implements
//! `miette::Diagnostic`, so a caller can hand it to `miette::Report` and get a
//! rendered snippet with the failure position highlighted.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification, mirroring the [`WeftError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The root parser failed.
    Parse,
    /// The root parser succeeded but left input behind.
    Incomplete,
    /// A parser could not be constructed.
    Grammar,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "Parse",
            ErrorType::Incomplete => "Incomplete",
            ErrorType::Grammar => "Grammar",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// The input being parsed (if any).
    pub source: Option<SourceArc>,
    /// Byte offset the error points at.
    pub offset: Option<usize>,
    /// Length in bytes of the highlighted region.
    pub len: usize,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Creates a context pointing at `offset` within `input`.
    pub fn at(input: &str, offset: usize) -> Self {
        let len = input
            .get(offset..)
            .and_then(|rest| rest.chars().next())
            .map_or(0, char::len_utf8);
        Self {
            source: Some(to_error_source(input)),
            offset: Some(offset),
            len,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Unified error type for every way a top-level parse can go wrong.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error("Parse error at line {line}, col {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
        index: usize,
        found: String,
        ctx: ErrorContext,
    },
    #[error("Parser did not consume entire input. Stopped at index {index}")]
    Incomplete { index: usize, ctx: ErrorContext },
    #[error("Invalid grammar: {message}")]
    Grammar {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl WeftError {
    /// Builds a parse error for a failure at `index` within `input`,
    /// computing the 1-based line and column.
    pub fn parse_failure(
        input: &str,
        index: usize,
        message: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        let (line, column) = line_col(input, index);
        WeftError::Parse {
            message: message.into(),
            line,
            column,
            index,
            found: found.into(),
            ctx: ErrorContext::at(input, index),
        }
    }

    pub fn incomplete(input: &str, index: usize) -> Self {
        WeftError::Incomplete {
            index,
            ctx: ErrorContext::at(input, index)
                .with_help("use ParseOptions::default().with_consume_all(false) to allow trailing input"),
        }
    }

    pub fn grammar(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        WeftError::Grammar {
            message: message.into(),
            source,
        }
    }

    fn get_ctx(&self) -> Option<&ErrorContext> {
        match self {
            WeftError::Parse { ctx, .. } | WeftError::Incomplete { ctx, .. } => Some(ctx),
            WeftError::Grammar { .. } => None,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            WeftError::Parse { .. } => ErrorType::Parse,
            WeftError::Incomplete { .. } => ErrorType::Incomplete,
            WeftError::Grammar { .. } => ErrorType::Grammar,
        }
    }

    /// Byte offset into the input the error refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            WeftError::Parse { index, .. } | WeftError::Incomplete { index, .. } => Some(*index),
            WeftError::Grammar { .. } => None,
        }
    }
}

impl Diagnostic for WeftError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self {
            WeftError::Parse { .. } => "weft::parse",
            WeftError::Incomplete { .. } => "weft::incomplete",
            WeftError::Grammar { .. } => "weft::grammar",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()?
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()?
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx()?;
        let offset = ctx.offset?;
        let text = match self {
            WeftError::Parse { message, found, .. } => format!("{message} (found {found})"),
            WeftError::Incomplete { .. } => "unconsumed input starts here".to_string(),
            WeftError::Grammar { .. } => return None,
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(text),
            offset,
            ctx.len,
        ))))
    }
}

/// Converts an input string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(source: S) -> SourceArc {
    Arc::new(NamedSource::new("input", source.as_ref().to_string()))
}

/// 1-based (line, column) of byte `index` in `input`.
///
/// Lines are counted by `'\n'`; the column counts characters since the last
/// newline. An index past the end is clamped to the input length.
pub fn line_col(input: &str, index: usize) -> (usize, usize) {
    let mut index = index.min(input.len());
    while !input.is_char_boundary(index) {
        index -= 1;
    }
    let before = &input[..index];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
