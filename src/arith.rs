//! A left-recursive calculator grammar.
//!
//! ```text
//! expr   := expr ('+' | '-') term | term
//! term   := term ('*' | '/') factor | factor
//! factor := number | '(' expr ')'
//! ```
//!
//! Both binary levels are written left-recursively, so `10-5-2` groups as
//! `(10-5)-2`. Whitespace is allowed around every token. Arithmetic follows
//! IEEE-754, so dividing by zero yields an infinity rather than an error.

use crate::diagnostics::WeftError;
use crate::left_recursion::left_recursive;
use crate::parser::combinators::between;
use crate::parser::primitives::{char, number, one_of, spaces};
use crate::parser::{recursive, Parser};
use crate::session::{ParseOptions, SessionStats};

fn token(c: char) -> Parser<char> {
    char(c).lexeme()
}

fn apply(op: char, a: f64, b: f64) -> f64 {
    match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        _ => a / b,
    }
}

/// One level of left-associative binary operators over `operand`.
fn binary_level(operators: &str, operand: Parser<f64>, name: &str) -> Parser<f64> {
    let operator = one_of(operators).lexeme();
    left_recursive(move |level: Parser<f64>| {
        level
            .then(operator)
            .then(operand.clone())
            .map(|((a, op), b)| apply(op, a, b))
            .or(operand)
    })
    .named(name)
}

/// The expression grammar, without surrounding whitespace handling.
pub fn expression() -> Parser<f64> {
    recursive(|expr: Parser<f64>| {
        let factor = number()
            .lexeme()
            .or(between(token('('), expr, token(')')))
            .label("Expected number or '('");
        let term = binary_level("*/", factor, "term");
        binary_level("+-", term, "expression")
    })
}

/// The full calculator: leading whitespace, then an expression.
pub fn calculator() -> Parser<f64> {
    spaces().skip_then(expression())
}

/// Evaluates `input`, which must consist of exactly one expression.
pub fn evaluate(input: &str) -> Result<f64, WeftError> {
    calculator().parse(input)
}

/// Like [`evaluate`], also returning the session's counters.
pub fn evaluate_with_stats(
    input: &str,
    options: ParseOptions,
) -> (Result<f64, WeftError>, SessionStats) {
    calculator().parse_with_stats(input, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(evaluate("10-5-2").unwrap(), 3.0);
        assert_eq!(evaluate("1+2*3").unwrap(), 7.0);
        assert_eq!(evaluate("(1+2)*3").unwrap(), 9.0);
        assert_eq!(evaluate("24/4/2").unwrap(), 3.0);
        assert_eq!(evaluate("  2 * ( 3 + 4 ) - 1 ").unwrap(), 13.0);
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert!(evaluate("1/0").unwrap().is_infinite());
    }

    #[test]
    fn test_trailing_garbage_is_incomplete() {
        let err = evaluate("1+2)").unwrap_err();
        assert_eq!(err.error_type(), crate::diagnostics::ErrorType::Incomplete);
        assert_eq!(err.index(), Some(3));
    }

    #[test]
    fn test_missing_operand_is_reported() {
        let err = evaluate("*2").unwrap_err();
        assert!(err.to_string().contains("Expected number or '('"));
    }
}
