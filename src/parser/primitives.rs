//! Primitive parsers: literals, character classes, regexes and the trivial
//! parsers every grammar bottoms out in.
//!
//! A literal that matches a prefix of itself before diverging reports its
//! failure at the first mismatching character, so that furthest-failure
//! selection in [`choice`](super::combinators::choice) can tell how far each
//! alternative got. Because that failure has advanced past the call position,
//! it also commits under [`Parser::or`]; wrap the literal in
//! [`Parser::attempt`] when partial matches should backtrack.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::WeftError;
use crate::parser::{Parser, ParserKind};
use crate::state::{ContextState, Cursor, ParseResult};

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").expect("integer pattern is valid"));

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("number pattern is valid")
});

/// Matches `literal` exactly.
pub fn string<S: Cursor>(literal: impl Into<String>) -> Parser<String, S> {
    let literal: String = literal.into();
    let description = format!("{literal:?}");
    let message = format!("Expected {description}");
    Parser::new(ParserKind::Literal, description, move |state: &S, _| {
        let rest = state.remaining();
        if rest.starts_with(literal.as_str()) {
            return ParseResult::success(literal.clone(), state.advance(literal.len()));
        }
        let matched: usize = rest
            .chars()
            .zip(literal.chars())
            .take_while(|(found, wanted)| found == wanted)
            .map(|(found, _)| found.len_utf8())
            .sum();
        ParseResult::failure(message.clone(), state.advance(matched))
    })
}

/// Matches the single character `c`.
pub fn char<S: Cursor>(c: char) -> Parser<char, S> {
    satisfy_described(ParserKind::Literal, format!("{c:?}"), move |found| found == c)
}

/// Matches one character accepted by `predicate`.
pub fn satisfy<S, F>(description: impl Into<String>, predicate: F) -> Parser<char, S>
where
    S: Cursor,
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    satisfy_described(ParserKind::Satisfy, description.into(), predicate)
}

fn satisfy_described<S, F>(kind: ParserKind, description: String, predicate: F) -> Parser<char, S>
where
    S: Cursor,
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    let message = format!("Expected {description}");
    Parser::new(kind, description, move |state: &S, _| {
        match state.remaining().chars().next() {
            Some(c) if predicate(c) => ParseResult::success(c, state.advance(c.len_utf8())),
            _ => ParseResult::failure(message.clone(), state.clone()),
        }
    })
}

/// Matches any single character.
pub fn any_char<S: Cursor>() -> Parser<char, S> {
    satisfy("any character", |_| true)
}

/// Matches one character contained in `chars`.
pub fn one_of<S: Cursor>(chars: &str) -> Parser<char, S> {
    let set: Vec<char> = chars.chars().collect();
    satisfy(format!("one of {chars:?}"), move |c| set.contains(&c))
}

/// Matches one character not contained in `chars`.
pub fn none_of<S: Cursor>(chars: &str) -> Parser<char, S> {
    let set: Vec<char> = chars.chars().collect();
    satisfy(format!("none of {chars:?}"), move |c| !set.contains(&c))
}

pub fn digit<S: Cursor>() -> Parser<char, S> {
    satisfy("digit", |c| c.is_ascii_digit())
}

pub fn letter<S: Cursor>() -> Parser<char, S> {
    satisfy("letter", |c: char| c.is_alphabetic())
}

pub fn alphanumeric<S: Cursor>() -> Parser<char, S> {
    satisfy("letter or digit", |c: char| c.is_alphanumeric())
}

pub fn whitespace<S: Cursor>() -> Parser<char, S> {
    satisfy("whitespace", |c: char| c.is_whitespace())
}

/// Skips zero or more whitespace characters. Never fails.
pub fn spaces<S: Cursor>() -> Parser<(), S> {
    Parser::new(ParserKind::Satisfy, "spaces", |state: &S, _| {
        let rest = state.remaining();
        let skipped = rest.len() - rest.trim_start().len();
        ParseResult::success((), state.advance(skipped))
    })
}

/// Matches `pattern` anchored at the current position, yielding the matched
/// text.
///
/// Fails with [`WeftError::Grammar`] when the pattern does not compile.
pub fn regex<S: Cursor>(pattern: &str) -> Result<Parser<String, S>, WeftError> {
    let anchored = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
        WeftError::grammar(format!("invalid regex /{pattern}/"), Some(Box::new(e)))
    })?;
    let description = format!("/{pattern}/");
    let message = format!("Expected {description}");
    Ok(Parser::new(ParserKind::Regex, description, move |state: &S, _| {
        match anchored.find(state.remaining()) {
            Some(m) => ParseResult::success(m.as_str().to_string(), state.advance(m.end())),
            None => ParseResult::failure(message.clone(), state.clone()),
        }
    }))
}

/// Parses an optionally signed decimal integer.
pub fn integer<S: Cursor>() -> Parser<i64, S> {
    numeric(&INTEGER, "integer")
}

/// Parses an optionally signed decimal number with optional fraction and
/// exponent.
pub fn number<S: Cursor>() -> Parser<f64, S> {
    numeric(&NUMBER, "number")
}

fn numeric<S, N>(pattern: &'static Lazy<Regex>, what: &'static str) -> Parser<N, S>
where
    S: Cursor,
    N: std::str::FromStr + 'static,
{
    let message = format!("Expected {what}");
    Parser::new(ParserKind::Regex, what, move |state: &S, _| {
        let Some(m) = pattern.find(state.remaining()) else {
            return ParseResult::failure(message.clone(), state.clone());
        };
        match m.as_str().parse::<N>() {
            Ok(n) => ParseResult::success(n, state.advance(m.end())),
            Err(_) => ParseResult::failure(
                format!("Invalid {what} {:?}", m.as_str()),
                state.clone(),
            ),
        }
    })
}

/// Succeeds with `value` without consuming input.
pub fn succeed<T, S>(value: T) -> Parser<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Cursor,
{
    Parser::new(ParserKind::Pure, "nothing", move |state: &S, _| {
        ParseResult::success(value.clone(), state.clone())
    })
}

/// Fails with `message` without consuming input.
pub fn fail<T: 'static, S: Cursor>(message: impl Into<String>) -> Parser<T, S> {
    let message: String = message.into();
    Parser::new(ParserKind::Fail, message.clone(), move |state: &S, _| {
        ParseResult::failure(message.clone(), state.clone())
    })
}

/// Succeeds with `()` only at the end of input.
pub fn end_of_input<S: Cursor>() -> Parser<(), S> {
    Parser::new(ParserKind::EndOfInput, "end of input", |state: &S, _| {
        if state.is_at_end() {
            ParseResult::success((), state.clone())
        } else {
            ParseResult::failure("Expected end of input", state.clone())
        }
    })
}

/// The current byte offset, without consuming input.
pub fn position<S: Cursor>() -> Parser<usize, S> {
    Parser::new(ParserKind::Pure, "position", |state: &S, _| {
        ParseResult::success(state.index(), state.clone())
    })
}

/// Yields a copy of the context carried by the state.
pub fn read_context<C>() -> Parser<C, ContextState<C>>
where
    C: Clone + fmt::Debug + 'static,
{
    Parser::new(ParserKind::Context, "context", |state: &ContextState<C>, _| {
        ParseResult::success(state.context().clone(), state.clone())
    })
}

/// Replaces the carried context with `f(current)`, without consuming input.
pub fn update_context<C, F>(f: F) -> Parser<(), ContextState<C>>
where
    C: Clone + fmt::Debug + 'static,
    F: Fn(&C) -> C + Send + Sync + 'static,
{
    Parser::new(
        ParserKind::Context,
        "context update",
        move |state: &ContextState<C>, _| {
            let next = f(state.context());
            ParseResult::success((), state.with_context(next))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ParseState;

    fn run<T: 'static>(p: &Parser<T>, input: &str) -> ParseResult<T> {
        p.run_fresh(&ParseState::new(input))
    }

    #[test]
    fn test_string_reports_mismatch_position() {
        let result = run(&string("abc"), "abd");
        assert!(result.is_failure());
        assert_eq!(result.index(), 2);
        assert_eq!(result.message(), Some("Expected \"abc\""));
    }

    #[test]
    fn test_string_success_advances() {
        let result = run(&string("hé"), "héllo");
        assert_eq!(result.value().map(String::as_str), Some("hé"));
        assert_eq!(result.index(), 3);
    }

    #[test]
    fn test_char_classes() {
        assert_eq!(run(&digit(), "7x").value(), Some(&'7'));
        assert!(run(&digit(), "x7").is_failure());
        assert_eq!(run(&one_of("+-"), "-1").value(), Some(&'-'));
        assert!(run(&none_of("+-"), "-1").is_failure());
        assert!(run(&any_char(), "").is_failure());
    }

    #[test]
    fn test_spaces_never_fails() {
        assert_eq!(run(&spaces(), "  \n\tx").index(), 4);
        assert_eq!(run(&spaces(), "x").index(), 0);
    }

    #[test]
    fn test_regex_is_anchored() {
        let word: Parser<String> = regex("[a-z]+").unwrap();
        assert_eq!(run(&word, "abc1").value().map(String::as_str), Some("abc"));
        assert!(run(&word, "1abc").is_failure());
    }

    #[test]
    fn test_invalid_regex_is_grammar_error() {
        let err = regex::<ParseState>("(unclosed").unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Grammar);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(run(&integer(), "-42rest").value(), Some(&-42));
        assert_eq!(run(&number(), "3.5e2").value(), Some(&350.0));
        assert_eq!(run(&number(), ".5").value(), Some(&0.5));
        assert!(run(&number(), "x").is_failure());
        let huge = run(&integer(), "99999999999999999999");
        assert_eq!(
            huge.message(),
            Some("Invalid integer \"99999999999999999999\"")
        );
    }

    #[test]
    fn test_succeed_and_fail_consume_nothing() {
        let ok = run(&succeed(5u8), "abc");
        assert_eq!((ok.value(), ok.index()), (Some(&5), 0));
        let err = run(&fail::<u8, ParseState>("nope"), "abc");
        assert_eq!((err.message(), err.index()), (Some("nope"), 0));
        assert_eq!(run(&whitespace(), "\tx").value(), Some(&'\t'));
    }

    #[test]
    fn test_end_of_input() {
        assert!(run(&end_of_input(), "").is_success());
        assert!(run(&end_of_input(), "a").is_failure());
    }

    #[test]
    fn test_context_primitives() {
        let bump = update_context(|n: &u32| n + 1);
        let state = ContextState::new("", 1u32);
        let after = bump.run_fresh(&state);
        let read = read_context::<u32>();
        assert_eq!(read.run_fresh(after.state()).value(), Some(&2));
    }
}
