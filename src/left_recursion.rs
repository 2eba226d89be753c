//! Left-recursion resolution by seed growing.
//!
//! A left-recursive rule such as `expr := expr '-' term | term` would recurse
//! forever under plain recursive descent. Wrapping the rule with
//! [`Parser::left_rec`] (or defining it with [`left_recursive`]) evaluates it
//! as a fixpoint instead:
//!
//! 1. The first invocation at an index records a seed, initially a failure,
//!    and runs the body. Reentrant invocations at the same index get the seed
//!    back instead of recursing, so the recursive branch fails and the base
//!    case produces the first real answer.
//! 2. As long as a pass succeeds and gets further than the current seed, the
//!    pass becomes the new seed and the body runs again from the same start.
//! 3. The last seed is the answer. It is memoized unless it was built on the
//!    seed of an enclosing left-recursive evaluation that is still growing.
//!
//! Because each accepted pass must end strictly further along, the loop
//! terminates after at most `remaining input + 1` growth passes;
//! [`ParseOptions::max_growth_passes`](crate::session::ParseOptions) can
//! lower that bound.

use crate::parser::{recursive, Parser, ParserId, ParserKind};
use crate::session::GrowthPhase;
use crate::state::{Cursor, ParseResult};

impl<T: Clone + 'static, S: Cursor> Parser<T, S> {
    /// Evaluates this parser as a left-recursive rule.
    ///
    /// The body must reach itself through the returned parser, so this is
    /// normally applied inside [`recursive`]; [`left_recursive`] does both.
    pub fn left_rec(&self) -> Parser<T, S> {
        let body = self.clone();
        let id = ParserId::fresh();
        let description = self.description().to_string();
        let kind = ParserKind::LeftRecursive;
        Parser::with_id(id, kind, description.clone(), move |state: &S, session| {
            let key = (id, state.index());
            if let Some(seed) = session.left_recursion_seed::<T, S>(key) {
                return seed;
            }
            if session.memo_contains(&key) {
                if let Some(resolved) = session.memo_get::<T, S>(key) {
                    return resolved;
                }
            }

            let (result, provisional) = session.track_seed_reads(|session| {
                session.left_recursion_begin::<T, S>(
                    key,
                    ParseResult::failure(
                        format!("left recursion: no answer yet for {description}"),
                        state.clone(),
                    ),
                );
                let cap = session
                    .options()
                    .max_growth_passes
                    .unwrap_or(state.remaining().len() + 1);
                let mut growth_passes = 0usize;

                let result = loop {
                    session.count_left_recursion_pass();
                    let pass = body.run(state, session);
                    let seeding =
                        session.left_recursion_phase::<T, S>(key) == Some(GrowthPhase::Seeding);
                    let seed = match session.left_recursion_peek::<T, S>(key) {
                        Some(seed) => seed.clone(),
                        None => break pass,
                    };
                    let improves = match (&pass, &seed) {
                        (ParseResult::Success { .. }, ParseResult::Failure { .. }) => true,
                        (ParseResult::Success { .. }, ParseResult::Success { .. }) => {
                            pass.index() > seed.index()
                        }
                        _ => false,
                    };
                    if !improves {
                        // A failing first pass is the rule's answer; later
                        // non-improving passes leave the grown seed in place.
                        break if seeding { pass } else { seed };
                    }
                    if !seeding {
                        growth_passes += 1;
                    }
                    log::debug!(
                        "left recursion {id} at {}: seed grown to index {}",
                        key.1,
                        pass.index()
                    );
                    if growth_passes >= cap {
                        log::warn!(
                            "left recursion {id} at {}: stopped after {growth_passes} growth passes",
                            key.1
                        );
                        break pass;
                    }
                    session.left_recursion_grow(key, pass);
                };

                let retired = session.left_recursion_finish::<T, S>(key);
                debug_assert_eq!(retired.map(|entry| entry.phase), Some(GrowthPhase::Resolved));
                result
            });
            if !provisional {
                session.memo_put(key, &result);
            }
            result
        })
    }
}

/// Defines a left-recursive rule.
///
/// `define` receives a handle to the rule and returns its body; references to
/// the handle inside the body are resolved by seed growing.
///
/// ```
/// use weft::prelude::*;
///
/// let expr = left_recursive(|expr: Parser<i64>| {
///     expr.skip(char('-'))
///         .then(integer())
///         .map(|(a, b)| a - b)
///         .or(integer())
/// });
/// assert_eq!(expr.parse("10-5-2").unwrap(), 3);
/// ```
pub fn left_recursive<T, S, F>(define: F) -> Parser<T, S>
where
    T: Clone + 'static,
    S: Cursor,
    F: FnOnce(Parser<T, S>) -> Parser<T, S>,
{
    recursive(|handle| define(handle).left_rec())
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn subtraction() -> Parser<i64> {
        left_recursive(|expr: Parser<i64>| {
            expr.skip(char('-'))
                .then(integer())
                .map(|(a, b)| a - b)
                .or(integer())
        })
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(subtraction().parse("10-5-2").unwrap(), 3);
        assert_eq!(subtraction().parse("7").unwrap(), 7);
    }

    #[test]
    fn test_first_pass_failure_is_final() {
        let err = subtraction().parse("x").unwrap_err();
        assert!(err.to_string().contains("Expected integer"));
    }

    #[test]
    fn test_grows_through_every_operand() {
        let (result, stats) =
            subtraction().parse_with_stats("1-1-1-1", ParseOptions::default());
        assert_eq!(result.unwrap(), -2);
        // seed pass, three growth passes, one final pass that stops growing
        assert_eq!(stats.left_recursion_passes, 5);
        assert!(stats.left_recursion_reentries >= 5);
    }

    #[test]
    fn test_growth_cap_keeps_partial_answer() {
        let options = ParseOptions::default()
            .with_consume_all(false)
            .with_max_growth_passes(1);
        assert_eq!(subtraction().parse_with("9-1-1-1", options).unwrap(), 8);
    }
}
