//! The parser abstraction.
//!
//! A [`Parser`] is a cheap, cloneable handle to a parsing computation with a
//! stable identity. Identity is a [`ParserId`] drawn from a process-wide
//! counter when the parser is constructed; clones share it. The memo cache and
//! the left-recursion resolver key on `(ParserId, index)`, never on the
//! structure of the grammar.
//!
//! ## Execution contract
//!
//! [`Parser::run`] takes a state and the session of the parse in progress and
//! returns a [`ParseResult`]. It must not mutate the state, must always
//! return, and must not create session-scoped caches itself; those come from
//! the `Session` passed in.
//!
//! [`Parser::parse`] is the throwing boundary: it allocates the initial state
//! and a fresh session, runs the root parser, and converts a failure (or
//! unconsumed input) into a [`WeftError`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::diagnostics::WeftError;
use crate::session::{ParseOptions, Session, SessionStats};
use crate::state::{ContextState, Cursor, ParseResult, ParseState};

pub mod combinators;
pub mod primitives;

/// Parser identity, used for packrat keys and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(u64);

impl ParserId {
    /// Allocates a new identity.
    pub fn fresh() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Fixes an identity for session-table tests.
    #[cfg(test)]
    pub(crate) fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a parser was built from. Used for descriptions and debugging only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParserKind {
    Literal,
    Regex,
    Satisfy,
    Pure,
    Fail,
    EndOfInput,
    Context,
    Map,
    Chain,
    Or,
    Sequence,
    Choice,
    Many,
    Optional,
    SepBy,
    Lookahead,
    NotFollowedBy,
    Filter,
    Label,
    Tagged,
    Attempt,
    Recursive,
    Memoized,
    LeftRecursive,
    StepSequence,
    Intercepted,
    Custom,
}

type RunFn<T, S> = dyn Fn(&S, &mut Session) -> ParseResult<T, S> + Send + Sync;

struct Inner<T, S> {
    id: ParserId,
    kind: ParserKind,
    description: String,
    run: Box<RunFn<T, S>>,
}

/// A parser producing `T` over states of type `S`.
pub struct Parser<T, S = ParseState> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for Parser<T, S> {
    fn clone(&self) -> Self {
        Parser {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, S> fmt::Debug for Parser<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("description", &self.inner.description)
            .finish()
    }
}

impl<T: 'static, S: Cursor> Parser<T, S> {
    /// Builds a parser from a raw `run` function, assigning it a fresh id.
    pub fn new<F>(kind: ParserKind, description: impl Into<String>, run: F) -> Self
    where
        F: Fn(&S, &mut Session) -> ParseResult<T, S> + Send + Sync + 'static,
    {
        Self::with_id(ParserId::fresh(), kind, description, run)
    }

    /// Builds a parser under an identity allocated by the caller, for
    /// wrappers whose `run` needs to key session tables on their own id.
    pub(crate) fn with_id<F>(
        id: ParserId,
        kind: ParserKind,
        description: impl Into<String>,
        run: F,
    ) -> Self
    where
        F: Fn(&S, &mut Session) -> ParseResult<T, S> + Send + Sync + 'static,
    {
        Parser {
            inner: Arc::new(Inner {
                id,
                kind,
                description: description.into(),
                run: Box::new(run),
            }),
        }
    }

    /// Builds a [`ParserKind::Custom`] parser from a raw `run` function.
    pub fn from_fn<F>(description: impl Into<String>, run: F) -> Self
    where
        F: Fn(&S, &mut Session) -> ParseResult<T, S> + Send + Sync + 'static,
    {
        Self::new(ParserKind::Custom, description, run)
    }

    pub fn id(&self) -> ParserId {
        self.inner.id
    }

    pub fn kind(&self) -> ParserKind {
        self.inner.kind
    }

    /// Human-readable description, used in failure messages and step traces.
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Runs the parser at `state` within `session`.
    pub fn run(&self, state: &S, session: &mut Session) -> ParseResult<T, S> {
        (self.inner.run)(state, session)
    }

    /// Runs the parser with a throwaway session.
    pub fn run_fresh(&self, state: &S) -> ParseResult<T, S> {
        self.run(state, &mut Session::new())
    }

    /// The same parser under a different description (and a new id).
    pub fn named(&self, description: impl Into<String>) -> Self {
        let inner = self.clone();
        Parser::new(self.kind(), description, move |state, session| {
            inner.run(state, session)
        })
    }

    /// Interposes `f` on every `run` of this parser.
    ///
    /// `f` receives the wrapped parser, the state and the session, and decides
    /// whether and how to delegate. This is the hook resource-limiting or
    /// instrumentation layers use; the result is an ordinary parser that can
    /// be substituted anywhere the original was.
    pub fn intercept<F>(&self, f: F) -> Self
    where
        F: Fn(&Parser<T, S>, &S, &mut Session) -> ParseResult<T, S> + Send + Sync + 'static,
    {
        let inner = self.clone();
        Parser::new(
            ParserKind::Intercepted,
            self.description().to_string(),
            move |state, session| f(&inner, state, session),
        )
    }

    fn downgrade(&self) -> Weak<Inner<T, S>> {
        Arc::downgrade(&self.inner)
    }
}

impl<T: 'static> Parser<T, ParseState> {
    /// Parses `input` with the default options (the whole input must be
    /// consumed).
    pub fn parse(&self, input: &str) -> Result<T, WeftError> {
        self.parse_with(input, ParseOptions::default())
    }

    pub fn parse_with(&self, input: &str, options: ParseOptions) -> Result<T, WeftError> {
        self.parse_with_stats(input, options).0
    }

    /// Like [`parse_with`](Self::parse_with), also returning the session's
    /// counters.
    pub fn parse_with_stats(
        &self,
        input: &str,
        options: ParseOptions,
    ) -> (Result<T, WeftError>, SessionStats) {
        let mut session = Session::with_options(options);
        let result = self.run(&ParseState::new(input), &mut session);
        let stats = session.stats();
        log::trace!("parse by {} finished: {:?}", self.id(), stats);
        (finish(input, result, &options).map(|(value, _)| value), stats)
    }
}

impl<T: 'static, C: Clone + fmt::Debug + 'static> Parser<T, ContextState<C>> {
    /// Parses `input` starting from `context`, returning the value together
    /// with the context as it stood at the end.
    pub fn parse_in_context(
        &self,
        input: &str,
        context: C,
        options: ParseOptions,
    ) -> Result<(T, C), WeftError> {
        let mut session = Session::with_options(options);
        let result = self.run(&ContextState::new(input, context), &mut session);
        finish(input, result, &options).map(|(value, state)| (value, state.into_context()))
    }
}

fn finish<T, S: Cursor>(
    input: &str,
    result: ParseResult<T, S>,
    options: &ParseOptions,
) -> Result<(T, S), WeftError> {
    match result {
        ParseResult::Success { value, state } => {
            if options.consume_all && !state.is_at_end() {
                Err(WeftError::incomplete(input, state.index()))
            } else {
                Ok((value, state))
            }
        }
        ParseResult::Failure {
            message,
            state,
            found,
        } => Err(WeftError::parse_failure(input, state.index(), message, found)),
    }
}

/// Defines a parser that refers to itself.
///
/// `define` receives a forward handle to the parser being defined and returns
/// its body. The handle holds only a weak reference back, so the grammar does
/// not leak a reference cycle.
///
/// ```
/// use weft::prelude::*;
///
/// let nested = recursive(|nested: Parser<u32>| {
///     between(char('('), nested.optional(), char(')')).map(|inner| inner.map_or(1, |d| d + 1))
/// });
/// assert_eq!(nested.parse("((()))").unwrap(), 3);
/// ```
pub fn recursive<T, S, F>(define: F) -> Parser<T, S>
where
    T: 'static,
    S: Cursor,
    F: FnOnce(Parser<T, S>) -> Parser<T, S>,
{
    let slot: Arc<OnceCell<Weak<Inner<T, S>>>> = Arc::new(OnceCell::new());
    let handle_slot = Arc::clone(&slot);
    let handle = Parser::new(ParserKind::Recursive, "recursive rule", move |state: &S, session| {
        match handle_slot.get().and_then(Weak::upgrade) {
            Some(inner) => (inner.run)(state, session),
            None => ParseResult::failure(
                "recursive rule invoked before its definition completed",
                state.clone(),
            ),
        }
    });
    let defined = define(handle);
    // The slot was created above and is set exactly once.
    let _ = slot.set(defined.downgrade());
    defined
}
