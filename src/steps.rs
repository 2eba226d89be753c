//! Step-sequence grammars.
//!
//! [`steps`] turns an ordinary Rust function into a parser. The function gets
//! a [`Steps`] driver and requests sub-parses from it one at a time; the
//! driver threads the state between them and keeps a history of what each
//! step produced. A failing step returns [`StepAbort`], which the script
//! propagates with `?`:
//!
//! ```
//! use weft::prelude::*;
//!
//! let pair: Parser<(String, i64)> = steps(|s| {
//!     let key = s.parse(&regex("[a-z]+")?)?;
//!     s.parse(&char(':'))?;
//!     let value = s.parse(&integer())?;
//!     Ok((key, value))
//! });
//! assert_eq!(pair.parse("key:42").unwrap(), ("key".to_string(), 42));
//! ```
//!
//! When a step fails, the resulting failure keeps the failing step's position
//! and lists every step that succeeded before it.

use std::fmt::{self, Debug};

use serde::Serialize;

use crate::diagnostics::WeftError;
use crate::parser::{Parser, ParserKind};
use crate::session::Session;
use crate::state::{preview, Cursor, ParseResult};

const ABORTED: &str = "step sequence aborted";

/// One successful step, kept for failure messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionFrame {
    /// 1-based step number.
    pub step: usize,
    pub description: String,
    /// `Debug` rendering of the step's value.
    pub value: String,
    /// Index after the step.
    pub position: usize,
}

impl fmt::Display for ExecutionFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} = {} @ {}",
            self.step, self.description, self.value, self.position
        )
    }
}

/// Returned by a step that failed. Only the driver creates it, apart from the
/// conversion from [`WeftError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAbort {
    /// Message of a grammar error raised inside the script.
    reason: Option<String>,
}

impl StepAbort {
    fn recorded() -> Self {
        StepAbort { reason: None }
    }
}

impl fmt::Display for StepAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => f.write_str(reason),
            None => f.write_str(ABORTED),
        }
    }
}

impl std::error::Error for StepAbort {}

/// Grammar-construction errors (such as an invalid regex) inside a script
/// abort the sequence like a failing step, with the error's message as the
/// terminal failure.
impl From<WeftError> for StepAbort {
    fn from(err: WeftError) -> Self {
        log::debug!("step sequence aborted by grammar error: {err}");
        StepAbort {
            reason: Some(err.to_string()),
        }
    }
}

struct StepFailure<S> {
    message: String,
    state: S,
    found: String,
}

/// The driver handed to a step-sequence script.
pub struct Steps<'a, S: Cursor> {
    state: S,
    session: &'a mut Session,
    history: Vec<ExecutionFrame>,
    failure: Option<StepFailure<S>>,
}

impl<'a, S: Cursor> Steps<'a, S> {
    fn new(state: S, session: &'a mut Session) -> Self {
        Self {
            state,
            session,
            history: Vec::new(),
            failure: None,
        }
    }

    /// Runs `parser` at the current state, advancing on success.
    pub fn parse<T: Debug + 'static>(&mut self, parser: &Parser<T, S>) -> Result<T, StepAbort> {
        let description = parser.description().to_string();
        self.parse_as(description, parser)
    }

    /// Like [`parse`](Self::parse), recording the step under `description`.
    pub fn parse_as<T: Debug + 'static>(
        &mut self,
        description: impl Into<String>,
        parser: &Parser<T, S>,
    ) -> Result<T, StepAbort> {
        if self.failure.is_some() {
            return Err(StepAbort::recorded());
        }
        let description: String = description.into();
        match parser.run(&self.state, self.session) {
            ParseResult::Success { value, state } => {
                self.history.push(ExecutionFrame {
                    step: self.history.len() + 1,
                    description,
                    value: format!("{value:?}"),
                    position: state.index(),
                });
                self.state = state;
                Ok(value)
            }
            ParseResult::Failure {
                message,
                state,
                found,
            } => {
                log::debug!(
                    "step {} ({description}) failed at {}: {message}",
                    self.history.len() + 1,
                    state.index()
                );
                self.failure = Some(StepFailure {
                    message,
                    state,
                    found,
                });
                Err(StepAbort::recorded())
            }
        }
    }

    /// Runs `parser`, yielding `None` and staying put if it fails.
    pub fn parse_optional<T: Debug + 'static>(
        &mut self,
        parser: &Parser<T, S>,
    ) -> Result<Option<T>, StepAbort> {
        if self.failure.is_some() {
            return Err(StepAbort::recorded());
        }
        match parser.run(&self.state, self.session) {
            ParseResult::Success { value, state } => {
                self.history.push(ExecutionFrame {
                    step: self.history.len() + 1,
                    description: parser.description().to_string(),
                    value: format!("{value:?}"),
                    position: state.index(),
                });
                self.state = state;
                Ok(Some(value))
            }
            ParseResult::Failure { .. } => Ok(None),
        }
    }

    /// Aborts the sequence with `message` at the current position.
    pub fn fail<T>(&mut self, message: impl Into<String>) -> Result<T, StepAbort> {
        if self.failure.is_none() {
            self.failure = Some(StepFailure {
                message: message.into(),
                state: self.state.clone(),
                found: preview(&self.state),
            });
        }
        Err(StepAbort::recorded())
    }

    pub fn position(&self) -> usize {
        self.state.index()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// The steps that have succeeded so far.
    pub fn history(&self) -> &[ExecutionFrame] {
        &self.history
    }

    fn finish<T>(self, outcome: Result<T, StepAbort>) -> ParseResult<T, S> {
        let failure = match (outcome, self.failure) {
            (Ok(value), None) => return ParseResult::success(value, self.state),
            (_, Some(failure)) => failure,
            (Err(abort), None) => {
                let found = preview(&self.state);
                StepFailure {
                    message: abort.reason.unwrap_or_else(|| ABORTED.to_string()),
                    state: self.state,
                    found,
                }
            }
        };
        ParseResult::Failure {
            message: trace_message(&self.history, &failure.message),
            state: failure.state,
            found: failure.found,
        }
    }
}

fn trace_message(history: &[ExecutionFrame], terminal: &str) -> String {
    let mut message = format!(
        "step sequence failed after {} successful step(s):\n",
        history.len()
    );
    for frame in history {
        message.push_str(&format!("  {frame}\n"));
    }
    message.push_str(terminal);
    message
}

/// Builds a parser from an imperative script of sub-parses.
pub fn steps<T, S, F>(script: F) -> Parser<T, S>
where
    T: 'static,
    S: Cursor,
    F: Fn(&mut Steps<'_, S>) -> Result<T, StepAbort> + Send + Sync + 'static,
{
    Parser::new(
        ParserKind::StepSequence,
        "step sequence",
        move |state: &S, session| {
            let mut driver = Steps::new(state.clone(), session);
            let outcome = script(&mut driver);
            driver.finish(outcome)
        },
    )
}
