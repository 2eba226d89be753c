//! # weft
//!
//! A parser-combinator engine: typed, composable parsers over strings with
//! backtracking, packrat memoization, left-recursive rules and imperative
//! step-sequence grammars.
//!
//! ```
//! use weft::prelude::*;
//!
//! let list: Parser<Vec<i64>> = between(char('['), integer().sep_by(char(',')), char(']'));
//! assert_eq!(list.parse("[1,2,3]").unwrap(), vec![1, 2, 3]);
//! ```
//!
//! Grammars are built once and can be reused (and shared between threads);
//! every call to [`Parser::parse`] runs in a fresh [`Session`].

pub use crate::diagnostics::{line_col, ErrorContext, ErrorType, WeftError};
pub use crate::left_recursion::left_recursive;
pub use crate::parser::{recursive, Parser, ParserId, ParserKind};
pub use crate::session::{ParseOptions, Session, SessionStats};
pub use crate::state::{ContextState, Cursor, ParseResult, ParseState};
pub use crate::steps::{steps, ExecutionFrame, StepAbort, Steps};

pub mod arith;
pub mod cli;
pub mod diagnostics;
pub mod left_recursion;
pub mod packrat;
pub mod parser;
pub mod session;
pub mod state;
pub mod steps;

/// Everything needed to write grammars.
pub mod prelude {
    pub use crate::diagnostics::WeftError;
    pub use crate::left_recursion::left_recursive;
    pub use crate::parser::combinators::{between, choice, not_followed_by, sequence};
    pub use crate::parser::primitives::{
        alphanumeric, any_char, char, digit, end_of_input, fail, integer, letter, none_of,
        number, one_of, position, read_context, regex, satisfy, spaces, string, succeed,
        update_context, whitespace,
    };
    pub use crate::parser::{recursive, Parser};
    pub use crate::session::{ParseOptions, Session};
    pub use crate::state::{ContextState, Cursor, ParseResult, ParseState};
    pub use crate::steps::{steps, StepAbort, Steps};
}
