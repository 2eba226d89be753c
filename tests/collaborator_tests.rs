// tests/collaborator_tests.rs
//
// Layers built on top of `run`: a streaming reader, a depth limiter and a
// contextual grammar.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft::prelude::*;

/// Splits complete `;`-terminated records off a growing buffer.
struct RecordStream {
    buffer: String,
    record: Parser<String>,
}

impl RecordStream {
    fn new() -> Self {
        let record = none_of(";")
            .many1()
            .skip(char(';'))
            .map(|cs| cs.into_iter().collect());
        Self {
            buffer: String::new(),
            record,
        }
    }

    fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut records = Vec::new();
        loop {
            let state = ParseState::new(self.buffer.as_str());
            match self.record.run(&state, &mut Session::new()).into_result() {
                Ok((value, rest)) => {
                    self.buffer.drain(..rest.index());
                    records.push(value);
                }
                // wait for more input
                Err(_) => break,
            }
        }
        records
    }
}

#[test]
fn test_streaming_reader_waits_for_complete_records() {
    let mut stream = RecordStream::new();
    assert!(stream.feed("alp").is_empty());
    assert_eq!(stream.feed("ha;be"), vec!["alpha"]);
    assert_eq!(stream.feed("ta;gamma;"), vec!["beta", "gamma"]);
    assert!(stream.buffer.is_empty());
}

const DEPTH_LIMIT_PREFIX: &str = "resource limit:";

/// Wraps `parser` so that nesting deeper than `max_depth` fails.
fn depth_limited<T: 'static>(parser: Parser<T>, max_depth: usize) -> Parser<T> {
    let depth = Arc::new(AtomicUsize::new(0));
    parser.intercept(move |inner, state, session| {
        let current = depth.fetch_add(1, Ordering::SeqCst) + 1;
        let result = if current > max_depth {
            ParseResult::failure(
                format!("{DEPTH_LIMIT_PREFIX} nesting deeper than {max_depth}"),
                state.clone(),
            )
        } else {
            inner.run(state, session)
        };
        depth.fetch_sub(1, Ordering::SeqCst);
        result
    })
}

/// term := digit | '(' term ')', yielding the nesting depth.
fn nested(max_depth: usize) -> Parser<usize> {
    recursive(move |term: Parser<usize>| {
        let body = digit()
            .map(|_| 0)
            .or(between(char('('), term, char(')')).map(|d| d + 1));
        depth_limited(body, max_depth)
    })
}

#[test]
fn test_depth_limit_within_bounds() {
    assert_eq!(nested(4).parse("(((1)))").unwrap(), 3);
}

#[test]
fn test_depth_limit_breach_is_an_ordinary_failure() {
    let err = nested(2).parse("(((1)))").unwrap_err();
    assert!(err.to_string().contains(DEPTH_LIMIT_PREFIX));
    // the limiter's failure sits where the third level would have started
    assert_eq!(err.index(), Some(2));
}

#[test]
fn test_context_tracks_indentation_levels() {
    // A line is `>` repeated to at least the current depth, then a word.
    let depth_marks = char('>').many().map(|marks| marks.len());
    let line = depth_marks
        .then(letter().many1())
        .chain(|(depth, _)| {
            update_context(move |max: &usize| (*max).max(depth))
                .skip_then(read_context())
        })
        .skip(char('\n').optional());
    let doc: Parser<Vec<usize>, ContextState<usize>> = line.many1();

    let (maxima, deepest) = doc
        .parse_in_context(">a\n>>>b\nc\n", 0, ParseOptions::default())
        .unwrap();
    assert_eq!(maxima, vec![1, 3, 3]);
    assert_eq!(deepest, 3);
}

#[test]
fn test_context_is_restored_on_backtrack() {
    let bump = update_context(|n: &u32| n + 1);
    let first = bump.skip_then(char('x'));
    let second = char('y');
    let grammar: Parser<char, ContextState<u32>> = first.attempt().or(second);
    let (_, context) = grammar
        .parse_in_context("y", 0, ParseOptions::default())
        .unwrap();
    assert_eq!(context, 0);
}
