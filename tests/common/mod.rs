//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft::prelude::*;

/// Options that accept trailing input.
pub fn partial() -> ParseOptions {
    ParseOptions::default().with_consume_all(false)
}

/// Runs `parser` on `input` from index 0 with a fresh session.
pub fn run_at_start<T: 'static>(parser: &Parser<T>, input: &str) -> ParseResult<T> {
    parser.run_fresh(&ParseState::new(input))
}

/// The message of a failed result, or a panic if it succeeded.
pub fn failure_message<T: std::fmt::Debug>(result: &ParseResult<T>) -> String {
    match result {
        ParseResult::Failure { message, .. } => message.clone(),
        ParseResult::Success { value, .. } => panic!("expected failure, got {value:?}"),
    }
}

/// Counts how many times a wrapped parser is actually run.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn wrap<T: 'static>(&self, parser: Parser<T>) -> Parser<T> {
        let calls = Arc::clone(&self.0);
        parser.intercept(move |inner, state, session| {
            calls.fetch_add(1, Ordering::SeqCst);
            inner.run(state, session)
        })
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
