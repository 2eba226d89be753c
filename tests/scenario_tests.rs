// tests/scenario_tests.rs
//
// End-to-end behaviour through the public `parse` entry points.

mod common;

use common::partial;
use weft::prelude::*;
use weft::{ErrorType, WeftError};

#[test]
fn test_literal_parse() {
    let hello: Parser<String> = string("hello");
    assert_eq!(hello.parse("hello").unwrap(), "hello");
}

#[test]
fn test_many_without_consuming_everything() {
    let p = string("a").many();
    let (result, _) = p.parse_with_stats("aaab", partial());
    assert_eq!(result.unwrap(), vec!["a", "a", "a"]);
    let stopped = p.run_fresh(&ParseState::new("aaab"));
    assert_eq!(stopped.index(), 3);
}

#[test]
fn test_choice_error_mentions_every_alternative() {
    let p = choice(vec![string("hello"), string("world")]);
    let err = p.parse("goodbye").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("\"hello\""));
    assert!(text.contains("\"world\""));
    assert_eq!(
        text,
        "Parse error at line 1, col 1: Expected \"hello\" or \"world\""
    );
}

#[test]
fn test_left_recursive_addition() {
    let expr = left_recursive(|expr: Parser<i64>| {
        expr.skip(char('+'))
            .then(integer())
            .map(|(a, b)| a + b)
            .or(integer())
    });
    assert_eq!(expr.parse("1+2+3").unwrap(), 6);
}

#[test]
fn test_step_sequence_success_and_failure() {
    let kv: Parser<(String, f64)> = steps(|s| {
        let key = s.parse(&string("key"))?;
        s.parse(&string(":"))?;
        let value = s.parse(&number())?;
        Ok((key, value))
    });
    assert_eq!(kv.parse("key:42").unwrap(), ("key".to_string(), 42.0));

    let err = kv.parse("key:x").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("\"key\""));
    assert!(text.contains("\":\""));
    assert!(text.ends_with("Expected number"));
}

#[test]
fn test_error_position_on_later_line() {
    let line = letter().many1().skip(char('\n'));
    let p = line.many1().skip(end_of_input());
    // `many1` stops before the unfinished third line, so the error is
    // reported where end of input was expected.
    let err = p.parse("ab\ncd\nef!").unwrap_err();
    match &err {
        WeftError::Parse {
            line, column, index, ..
        } => {
            assert_eq!((*line, *column, *index), (3, 1, 6));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_incomplete_input() {
    let p: Parser<String> = string("ab");
    let err = p.parse("abc").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Incomplete);
    assert_eq!(
        err.to_string(),
        "Parser did not consume entire input. Stopped at index 2"
    );
    assert_eq!(p.parse_with("abc", partial()).unwrap(), "ab");
}

#[test]
fn test_diagnostic_codes() {
    use miette::Diagnostic;
    let p: Parser<String> = string("ab");
    let parse = p.parse("x").unwrap_err();
    assert_eq!(parse.code().map(|c| c.to_string()), Some("weft::parse".into()));
    let incomplete = p.parse("abx").unwrap_err();
    assert_eq!(
        incomplete.code().map(|c| c.to_string()),
        Some("weft::incomplete".into())
    );
    assert!(incomplete.help().is_some());
    let grammar = regex::<ParseState>("[").unwrap_err();
    assert_eq!(grammar.code().map(|c| c.to_string()), Some("weft::grammar".into()));
}
