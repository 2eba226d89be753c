//! Parse states and parse results.
//!
//! A state is an immutable cursor into the input: every transition builds a
//! new value and the old one stays valid, which is what makes backtracking a
//! matter of simply reusing an earlier state. All combinators are generic over
//! the [`Cursor`] trait so that richer states (such as [`ContextState`]) flow
//! through the same machinery as the plain [`ParseState`].

use std::fmt;
use std::sync::Arc;

/// Maximum number of characters shown in a failure's `found` preview.
const FOUND_PREVIEW_CHARS: usize = 12;

/// Anything that carries an index into an input string.
///
/// Implementations must keep `index()` on a `char` boundary and within
/// `0..=input().len()`.
pub trait Cursor: Clone + fmt::Debug + 'static {
    /// The whole input buffer.
    fn input(&self) -> &str;

    /// Byte offset of the cursor.
    fn index(&self) -> usize;

    /// A copy of this state moved to `index`.
    fn with_index(&self, index: usize) -> Self;

    /// The input from the cursor onwards.
    fn remaining(&self) -> &str {
        &self.input()[self.index()..]
    }

    fn is_at_end(&self) -> bool {
        self.index() >= self.input().len()
    }

    /// A copy of this state moved forward by `bytes`.
    fn advance(&self, bytes: usize) -> Self {
        self.with_index(self.index() + bytes)
    }
}

/// The plain parse state: a shared input buffer and a byte offset.
#[derive(Clone, PartialEq, Eq)]
pub struct ParseState {
    input: Arc<str>,
    index: usize,
}

impl ParseState {
    pub fn new(input: impl Into<Arc<str>>) -> Self {
        Self {
            input: input.into(),
            index: 0,
        }
    }

    /// Creates a state at `index`, clamped to the input length and moved back
    /// to the nearest `char` boundary.
    pub fn at(input: impl Into<Arc<str>>, index: usize) -> Self {
        let input = input.into();
        let mut index = index.min(input.len());
        while !input.is_char_boundary(index) {
            index -= 1;
        }
        Self { input, index }
    }
}

impl Cursor for ParseState {
    fn input(&self) -> &str {
        &self.input
    }

    fn index(&self) -> usize {
        self.index
    }

    fn with_index(&self, index: usize) -> Self {
        debug_assert!(index <= self.input.len());
        Self {
            input: Arc::clone(&self.input),
            index,
        }
    }
}

impl fmt::Debug for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseState")
            .field("index", &self.index)
            .field("len", &self.input.len())
            .finish()
    }
}

/// A parse state that also threads a user-defined context value.
///
/// The context is carried along with every transition; primitives such as
/// [`read_context`](crate::parser::primitives::read_context) and
/// [`update_context`](crate::parser::primitives::update_context) expose it
/// to grammars.
#[derive(Clone, PartialEq)]
pub struct ContextState<C> {
    base: ParseState,
    context: C,
}

impl<C> ContextState<C> {
    pub fn new(input: impl Into<Arc<str>>, context: C) -> Self {
        Self {
            base: ParseState::new(input),
            context,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn base(&self) -> &ParseState {
        &self.base
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// A copy of this state with the context replaced.
    pub fn with_context(&self, context: C) -> Self {
        Self {
            base: self.base.clone(),
            context,
        }
    }
}

impl<C: Clone + fmt::Debug + 'static> Cursor for ContextState<C> {
    fn input(&self) -> &str {
        self.base.input()
    }

    fn index(&self) -> usize {
        self.base.index()
    }

    fn with_index(&self, index: usize) -> Self {
        Self {
            base: self.base.with_index(index),
            context: self.context.clone(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for ContextState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextState")
            .field("index", &self.base.index)
            .field("context", &self.context)
            .finish()
    }
}

/// The outcome of running a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<T, S = ParseState> {
    Success {
        value: T,
        state: S,
    },
    /// `state` marks the furthest point reached before failing, which may be
    /// past the call-time position.
    Failure {
        message: String,
        state: S,
        found: String,
    },
}

impl<T, S: Cursor> ParseResult<T, S> {
    pub fn success(value: T, state: S) -> Self {
        ParseResult::Success { value, state }
    }

    /// A failure at `state`, with the `found` preview taken from the input
    /// there.
    pub fn failure(message: impl Into<String>, state: S) -> Self {
        let found = preview(&state);
        ParseResult::Failure {
            message: message.into(),
            state,
            found,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn state(&self) -> &S {
        match self {
            ParseResult::Success { state, .. } | ParseResult::Failure { state, .. } => state,
        }
    }

    /// Index of the result's state: the end of a success, or the furthest
    /// point of a failure.
    pub fn index(&self) -> usize {
        self.state().index()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ParseResult::Success { value, .. } => Some(value),
            ParseResult::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ParseResult::Success { .. } => None,
            ParseResult::Failure { message, .. } => Some(message),
        }
    }

    pub fn map_value<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U, S> {
        match self {
            ParseResult::Success { value, state } => ParseResult::Success {
                value: f(value),
                state,
            },
            ParseResult::Failure {
                message,
                state,
                found,
            } => ParseResult::Failure {
                message,
                state,
                found,
            },
        }
    }

    /// Splits off a success, handing a failure back retyped so a combinator
    /// producing another value type can return it unchanged.
    pub fn into_success<U>(self) -> Result<(T, S), ParseResult<U, S>> {
        match self {
            ParseResult::Success { value, state } => Ok((value, state)),
            ParseResult::Failure {
                message,
                state,
                found,
            } => Err(ParseResult::Failure {
                message,
                state,
                found,
            }),
        }
    }

    /// Splits into a standard `Result`, keeping the final state on both sides.
    pub fn into_result(self) -> Result<(T, S), (String, S)> {
        match self {
            ParseResult::Success { value, state } => Ok((value, state)),
            ParseResult::Failure { message, state, .. } => Err((message, state)),
        }
    }
}

/// A short rendering of the input at `state`, used as a failure's `found`.
pub fn preview<S: Cursor>(state: &S) -> String {
    let rest = state.remaining();
    if rest.is_empty() {
        return "end of input".to_string();
    }
    let shown: String = rest.chars().take(FOUND_PREVIEW_CHARS).collect();
    if shown.len() < rest.len() {
        format!("{shown:?}...")
    } else {
        format!("{shown:?}")
    }
}
