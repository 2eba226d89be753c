//! Combinators: functions that build new parsers out of existing ones.
//!
//! Every combinator returns a fresh [`Parser`] with its own identity and
//! threads the session through to its children unchanged.
//!
//! ## Backtracking
//!
//! [`Parser::or`] only tries its alternative when the first branch failed
//! without advancing past the call position. Once a branch has consumed input
//! it owns the failure. [`choice`] tries every alternative regardless and, if
//! all of them fail, reports the one that got furthest. [`Parser::attempt`]
//! turns a consuming failure back into a non-consuming one.

use std::ops::BitOr;

use crate::parser::primitives::spaces;
use crate::parser::{Parser, ParserKind};
use crate::state::{Cursor, ParseResult};

const INFINITE_LOOP_MESSAGE: &str =
    "Infinite loop in many(): parser succeeded without consuming input";

impl<T: 'static, S: Cursor> Parser<T, S> {
    /// Transforms a successful value.
    pub fn map<U, F>(&self, f: F) -> Parser<U, S>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.clone();
        Parser::new(ParserKind::Map, self.description(), move |state, session| {
            inner.run(state, session).map_value(&f)
        })
    }

    /// Replaces a successful value with `value`.
    pub fn map_to<U>(&self, value: U) -> Parser<U, S>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.map(move |_| value.clone())
    }

    /// Runs the parser returned by `f` from where this one stopped.
    pub fn chain<U, F>(&self, f: F) -> Parser<U, S>
    where
        U: 'static,
        F: Fn(T) -> Parser<U, S> + Send + Sync + 'static,
    {
        let inner = self.clone();
        Parser::new(ParserKind::Chain, self.description(), move |state, session| {
            match inner.run(state, session).into_success() {
                Ok((value, next)) => f(value).run(&next, session),
                Err(failure) => failure,
            }
        })
    }

    /// Tries `other` from the original state when this parser fails without
    /// consuming input.
    pub fn or(&self, other: Parser<T, S>) -> Parser<T, S> {
        let first = self.clone();
        let description = format!("{} or {}", self.description(), other.description());
        Parser::new(ParserKind::Or, description, move |state: &S, session| {
            let result = first.run(state, session);
            let retry = matches!(
                &result,
                ParseResult::Failure { state: failed, .. } if failed.index() == state.index()
            );
            if retry {
                other.run(state, session)
            } else {
                result
            }
        })
    }

    /// Parses `self` then `other`, keeping both values.
    pub fn then<U: 'static>(&self, other: Parser<U, S>) -> Parser<(T, U), S> {
        let first = self.clone();
        let description = format!("{} {}", self.description(), other.description());
        Parser::new(ParserKind::Sequence, description, move |state, session| {
            match first.run(state, session).into_success() {
                Ok((a, next)) => other.run(&next, session).map_value(|b| (a, b)),
                Err(failure) => failure,
            }
        })
    }

    /// Parses `self` then `other`, keeping only this parser's value.
    pub fn skip<U: 'static>(&self, other: Parser<U, S>) -> Parser<T, S> {
        self.then(other).map(|(a, _)| a)
    }

    /// Parses `self` then `other`, keeping only `other`'s value.
    pub fn skip_then<U: 'static>(&self, other: Parser<U, S>) -> Parser<U, S> {
        self.then(other).map(|(_, b)| b)
    }

    /// Zero or more repetitions.
    pub fn many(&self) -> Parser<Vec<T>, S> {
        repeat(self, 0, format!("many({})", self.description()))
    }

    /// One or more repetitions.
    pub fn many1(&self) -> Parser<Vec<T>, S> {
        repeat(self, 1, format!("many1({})", self.description()))
    }

    /// Exactly `n` repetitions.
    pub fn count(&self, n: usize) -> Parser<Vec<T>, S> {
        let inner = self.clone();
        let description = format!("{n} x {}", self.description());
        Parser::new(ParserKind::Many, description, move |state: &S, session| {
            let mut values = Vec::with_capacity(n);
            let mut current = state.clone();
            for _ in 0..n {
                match inner.run(&current, session).into_success() {
                    Ok((value, next)) => {
                        values.push(value);
                        current = next;
                    }
                    Err(failure) => return failure,
                }
            }
            ParseResult::success(values, current)
        })
    }

    /// `Some(value)` on success, `None` without consuming input otherwise.
    /// Never fails.
    pub fn optional(&self) -> Parser<Option<T>, S> {
        let inner = self.clone();
        let description = format!("optional {}", self.description());
        Parser::new(ParserKind::Optional, description, move |state: &S, session| {
            match inner.run(state, session) {
                ParseResult::Success { value, state } => ParseResult::success(Some(value), state),
                ParseResult::Failure { .. } => ParseResult::success(None, state.clone()),
            }
        })
    }

    /// Zero or more occurrences separated by `separator`. A trailing
    /// separator is left unconsumed.
    pub fn sep_by<U: 'static>(&self, separator: Parser<U, S>) -> Parser<Vec<T>, S> {
        separated(self, separator, false)
    }

    /// One or more occurrences separated by `separator`.
    pub fn sep_by1<U: 'static>(&self, separator: Parser<U, S>) -> Parser<Vec<T>, S> {
        separated(self, separator, true)
    }

    /// Fails with `message` (at the call position) when `predicate` rejects
    /// the parsed value.
    pub fn filter<F>(&self, predicate: F, message: impl Into<String>) -> Parser<T, S>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let inner = self.clone();
        let message: String = message.into();
        Parser::new(ParserKind::Filter, self.description(), move |state: &S, session| {
            match inner.run(state, session) {
                ParseResult::Success { value, .. } if !predicate(&value) => {
                    ParseResult::failure(message.clone(), state.clone())
                }
                result => result,
            }
        })
    }

    /// Replaces the message of any failure with `message`.
    pub fn label(&self, message: impl Into<String>) -> Parser<T, S> {
        let inner = self.clone();
        let message: String = message.into();
        Parser::new(ParserKind::Label, message.clone(), move |state, session| {
            match inner.run(state, session) {
                ParseResult::Failure { state, found, .. } => ParseResult::Failure {
                    message: message.clone(),
                    state,
                    found,
                },
                success => success,
            }
        })
    }

    /// Prefixes the message of any failure with `[in <name>]`.
    pub fn context(&self, name: impl Into<String>) -> Parser<T, S> {
        let inner = self.clone();
        let name: String = name.into();
        Parser::new(ParserKind::Tagged, self.description(), move |state, session| {
            match inner.run(state, session) {
                ParseResult::Failure {
                    message,
                    state,
                    found,
                } => ParseResult::Failure {
                    message: format!("[in {name}] {message}"),
                    state,
                    found,
                },
                success => success,
            }
        })
    }

    /// Succeeds with this parser's value without advancing.
    pub fn lookahead(&self) -> Parser<T, S> {
        let inner = self.clone();
        let description = format!("lookahead {}", self.description());
        Parser::new(ParserKind::Lookahead, description, move |state: &S, session| {
            match inner.run(state, session) {
                ParseResult::Success { value, .. } => ParseResult::success(value, state.clone()),
                failure => failure,
            }
        })
    }

    /// Rewinds any failure to the call position so that [`or`](Self::or)
    /// may try its alternative.
    pub fn attempt(&self) -> Parser<T, S> {
        let inner = self.clone();
        Parser::new(ParserKind::Attempt, self.description(), move |state: &S, session| {
            match inner.run(state, session) {
                ParseResult::Failure { message, .. } => ParseResult::failure(message, state.clone()),
                success => success,
            }
        })
    }

    /// Skips whitespace after this parser.
    pub fn lexeme(&self) -> Parser<T, S> {
        self.skip(spaces())
    }

    /// One or more `self` joined left-associatively by the functions `op`
    /// yields.
    pub fn chainl1<F>(&self, op: Parser<F, S>) -> Parser<T, S>
    where
        F: Fn(T, T) -> T + 'static,
    {
        let term = self.clone();
        let description = format!("chain of {}", self.description());
        Parser::new(ParserKind::Many, description, move |state: &S, session| {
            let (mut acc, mut current) = match term.run(state, session).into_success() {
                Ok(success) => success,
                Err(failure) => return failure,
            };
            loop {
                let (f, after_op) = match op.run(&current, session) {
                    ParseResult::Success { value, state } => (value, state),
                    ParseResult::Failure { .. } => break,
                };
                match term.run(&after_op, session) {
                    ParseResult::Success { value, state } => {
                        acc = f(acc, value);
                        current = state;
                    }
                    ParseResult::Failure {
                        message,
                        state,
                        found,
                    } => {
                        return ParseResult::Failure {
                            message,
                            state,
                            found,
                        }
                    }
                }
            }
            ParseResult::success(acc, current)
        })
    }
}

impl<T: 'static, S: Cursor> BitOr for Parser<T, S> {
    type Output = Parser<T, S>;

    /// `a | b` is `a.or(b)`.
    fn bitor(self, rhs: Parser<T, S>) -> Self::Output {
        self.or(rhs)
    }
}

fn repeat<T: 'static, S: Cursor>(
    inner: &Parser<T, S>,
    min: usize,
    description: String,
) -> Parser<Vec<T>, S> {
    let inner = inner.clone();
    Parser::new(ParserKind::Many, description, move |state: &S, session| {
        let mut values = Vec::new();
        let mut current = state.clone();
        loop {
            match inner.run(&current, session) {
                ParseResult::Success { value, state: next } => {
                    if next.index() == current.index() {
                        return ParseResult::failure(INFINITE_LOOP_MESSAGE, current);
                    }
                    values.push(value);
                    current = next;
                }
                ParseResult::Failure {
                    message,
                    state,
                    found,
                } => {
                    if values.len() < min {
                        return ParseResult::Failure {
                            message,
                            state,
                            found,
                        };
                    }
                    break;
                }
            }
        }
        ParseResult::success(values, current)
    })
}

fn separated<T: 'static, U: 'static, S: Cursor>(
    item: &Parser<T, S>,
    separator: Parser<U, S>,
    at_least_one: bool,
) -> Parser<Vec<T>, S> {
    let item = item.clone();
    let description = format!("{} separated by {}", item.description(), separator.description());
    Parser::new(ParserKind::SepBy, description, move |state: &S, session| {
        let (first, mut current) = match item.run(state, session) {
            ParseResult::Success { value, state } => (value, state),
            ParseResult::Failure {
                message,
                state: failed,
                found,
            } => {
                if at_least_one {
                    return ParseResult::Failure {
                        message,
                        state: failed,
                        found,
                    };
                }
                return ParseResult::success(Vec::new(), state.clone());
            }
        };
        let mut values = vec![first];
        loop {
            let after_separator = match separator.run(&current, session) {
                ParseResult::Success { state, .. } => state,
                ParseResult::Failure { .. } => break,
            };
            match item.run(&after_separator, session) {
                ParseResult::Success { value, state } => {
                    if state.index() == current.index() {
                        return ParseResult::failure(INFINITE_LOOP_MESSAGE, current);
                    }
                    values.push(value);
                    current = state;
                }
                ParseResult::Failure { .. } => break,
            }
        }
        ParseResult::success(values, current)
    })
}

/// Runs `parsers` in order, collecting their values. The first failure is
/// returned as-is.
pub fn sequence<T: 'static, S: Cursor>(parsers: Vec<Parser<T, S>>) -> Parser<Vec<T>, S> {
    let description = parsers
        .iter()
        .map(|p| p.description().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    Parser::new(ParserKind::Sequence, description, move |state: &S, session| {
        let mut values = Vec::with_capacity(parsers.len());
        let mut current = state.clone();
        for parser in &parsers {
            match parser.run(&current, session).into_success() {
                Ok((value, next)) => {
                    values.push(value);
                    current = next;
                }
                Err(failure) => return failure,
            }
        }
        ParseResult::success(values, current)
    })
}

/// Returns the first alternative that succeeds.
///
/// When all fail, the failure that reached the greatest index is reported;
/// failures tied at that index have their messages combined with "or".
pub fn choice<T: 'static, S: Cursor>(parsers: Vec<Parser<T, S>>) -> Parser<T, S> {
    let description = parsers
        .iter()
        .map(|p| p.description().to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Parser::new(ParserKind::Choice, description, move |state: &S, session| {
        let mut failures: Vec<(String, S, String)> = Vec::new();
        for parser in &parsers {
            match parser.run(state, session) {
                ParseResult::Failure {
                    message,
                    state,
                    found,
                } => failures.push((message, state, found)),
                success => return success,
            }
        }
        furthest_failure(failures)
            .unwrap_or_else(|| ParseResult::failure("No alternatives", state.clone()))
    })
}

fn furthest_failure<T, S: Cursor>(failures: Vec<(String, S, String)>) -> Option<ParseResult<T, S>> {
    let furthest = failures.iter().map(|(_, state, _)| state.index()).max()?;
    let mut messages: Vec<String> = Vec::new();
    let mut chosen: Option<(S, String)> = None;
    for (message, state, found) in failures {
        if state.index() != furthest {
            continue;
        }
        if !messages.contains(&message) {
            messages.push(message);
        }
        chosen.get_or_insert((state, found));
    }
    let (state, found) = chosen?;
    Some(ParseResult::Failure {
        message: combine_messages(&messages),
        state,
        found,
    })
}

/// Joins tied failure messages with "or", folding a shared `Expected `
/// prefix.
fn combine_messages(messages: &[String]) -> String {
    const EXPECTED: &str = "Expected ";
    if messages.len() > 1 && messages.iter().all(|m| m.starts_with(EXPECTED)) {
        let wanted: Vec<&str> = messages.iter().map(|m| &m[EXPECTED.len()..]).collect();
        format!("{EXPECTED}{}", wanted.join(" or "))
    } else {
        messages.join(" or ")
    }
}

/// Parses `open`, `body`, `close` in order, keeping only `body`'s value.
pub fn between<A, T, B, S>(open: Parser<A, S>, body: Parser<T, S>, close: Parser<B, S>) -> Parser<T, S>
where
    A: 'static,
    T: 'static,
    B: 'static,
    S: Cursor,
{
    open.skip_then(body).skip(close)
}

/// Succeeds with `()` without consuming input exactly when `parser` fails at
/// the current position.
pub fn not_followed_by<T: 'static, S: Cursor>(parser: Parser<T, S>) -> Parser<(), S> {
    let description = format!("not {}", parser.description());
    let message = format!("Unexpected {}", parser.description());
    Parser::new(ParserKind::NotFollowedBy, description, move |state: &S, session| {
        match parser.run(state, session) {
            ParseResult::Success { .. } => ParseResult::failure(message.clone(), state.clone()),
            ParseResult::Failure { .. } => ParseResult::success((), state.clone()),
        }
    })
}
