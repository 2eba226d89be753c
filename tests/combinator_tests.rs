// tests/combinator_tests.rs

mod common;

use common::{failure_message, partial, run_at_start};
use rstest::rstest;
use weft::prelude::*;

#[rstest]
#[case("abc", true, 3)]
#[case("abd", false, 2)]
#[case("xbc", false, 0)]
#[case("ab", false, 2)]
fn test_literal_outcome_and_index(#[case] input: &str, #[case] ok: bool, #[case] index: usize) {
    let p: Parser<String> = string("abc");
    let result = run_at_start(&p, input);
    assert_eq!(result.is_success(), ok);
    assert_eq!(result.index(), index);
}

#[test]
fn test_or_commits_after_consuming() {
    let counter = common::CallCounter::default();
    let a = string("ab").skip_then(string("c"));
    let b = counter.wrap(string("abx"));
    let result = run_at_start(&a.or(b), "abx");
    assert_eq!(failure_message(&result), "Expected \"c\"");
    assert_eq!(result.index(), 2);
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_or_backtracks_without_consumption() {
    let p = string("x").or(string("y"));
    assert_eq!(p.parse("y").unwrap(), "y");
}

#[test]
fn test_attempt_allows_backtracking() {
    let p = string("ab").skip_then(string("c")).attempt().or(string("abx"));
    assert_eq!(p.parse("abx").unwrap(), "abx");
}

#[test]
fn test_choice_reports_furthest_failure() {
    let p = choice(vec![string("abc"), string("ax")]);
    let err = p.parse("abd").unwrap_err();
    assert_eq!(err.to_string(), "Parse error at line 1, col 3: Expected \"abc\"");
}

#[test]
fn test_choice_merges_tied_failures() {
    let p = choice(vec![string("cat"), string("dog"), string("cat")]);
    let result = run_at_start(&p, "emu");
    assert_eq!(failure_message(&result), "Expected \"cat\" or \"dog\"");
}

#[test]
fn test_empty_choice() {
    let p: Parser<String> = choice(Vec::new());
    assert_eq!(failure_message(&run_at_start(&p, "x")), "No alternatives");
}

#[rstest]
#[case("", 0)]
#[case("a", 1)]
#[case("aaab", 3)]
fn test_many_counts(#[case] input: &str, #[case] expected: usize) {
    let p = string("a").many();
    assert_eq!(p.parse_with(input, partial()).unwrap().len(), expected);
}

#[test]
fn test_many1_requires_one() {
    let err = char('a').many1().parse("b").unwrap_err();
    assert!(err.to_string().contains("Expected 'a'"));
}

#[test]
fn test_many_guards_against_zero_width_loops() {
    let p = succeed::<(), ParseState>(()).many();
    let message = failure_message(&run_at_start(&p, "abc"));
    assert!(message.contains("Infinite loop"));
}

#[test]
fn test_sequence_and_between() {
    let digits = sequence(vec![digit(), digit(), digit()]);
    assert_eq!(digits.parse("123").unwrap(), vec!['1', '2', '3']);
    let wrapped = between(char('<'), letter().many1(), char('>'));
    assert_eq!(wrapped.parse("<abc>").unwrap(), vec!['a', 'b', 'c']);
    assert!(wrapped.parse("<abc").is_err());
}

#[test]
fn test_lookahead_and_not_followed_by() {
    let peek = string("ab").lookahead();
    let result = run_at_start(&peek, "abc");
    assert_eq!(result.value().map(String::as_str), Some("ab"));
    assert_eq!(result.index(), 0);

    let keyword = string("if").skip(not_followed_by(alphanumeric()));
    assert_eq!(keyword.parse_with("if x", partial()).unwrap(), "if");
    let err = keyword.parse("iffy").unwrap_err();
    assert!(err.to_string().contains("Unexpected letter or digit"));
}

#[test]
fn test_filter_label_and_context() {
    let even = integer().filter(|n| n % 2 == 0, "Expected an even number");
    assert_eq!(even.parse("42").unwrap(), 42);
    assert_eq!(
        failure_message(&run_at_start(&even, "7")),
        "Expected an even number"
    );

    let labelled = digit().label("Expected a digit, friend");
    assert_eq!(
        failure_message(&run_at_start(&labelled, "x")),
        "Expected a digit, friend"
    );

    let tagged = digit().context("version");
    assert_eq!(
        failure_message(&run_at_start(&tagged, "x")),
        "[in version] Expected digit"
    );
}

#[test]
fn test_sep_by_with_lexemes() {
    let list = integer().lexeme().sep_by(char(',').lexeme());
    assert_eq!(list.parse("1 , 2,3 ").unwrap(), vec![1, 2, 3]);
    assert_eq!(list.parse("").unwrap(), Vec::<i64>::new());
}

#[test]
fn test_regex_and_map() {
    let ident = regex("[A-Za-z_][A-Za-z0-9_]*")
        .unwrap()
        .map(|s: String| s.to_uppercase());
    assert_eq!(ident.parse("snake_case1").unwrap(), "SNAKE_CASE1");
}

#[test]
fn test_position_reports_offset() {
    let p = spaces().skip_then(position()).skip(string("x"));
    assert_eq!(p.parse("   x").unwrap(), 3);
}
