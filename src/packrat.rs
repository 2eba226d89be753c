//! Packrat memoization.
//!
//! A memoized parser evaluates its body at most once per `(id, index)` within
//! a session; later invocations at the same index return a clone of the
//! recorded result, failures included. The table lives on the [`Session`],
//! so a new parse always starts cold.
//!
//! A result whose computation read the seed of a left-recursive rule that is
//! still growing is provisional and is not recorded (see
//! [`Session::track_seed_reads`]). Everything else is, including results
//! computed inside a left-recursive body.
//!
//! [`Session`]: crate::session::Session
//! [`Session::track_seed_reads`]: crate::session::Session::track_seed_reads

use crate::parser::{Parser, ParserId, ParserKind};
use crate::state::Cursor;

impl<T: Clone + 'static, S: Cursor> Parser<T, S> {
    /// Caches this parser's result per input position for the duration of a
    /// parse.
    pub fn memo(&self) -> Parser<T, S> {
        let inner = self.clone();
        let id = ParserId::fresh();
        let kind = ParserKind::Memoized;
        Parser::with_id(id, kind, self.description(), move |state: &S, session| {
            let key = (id, state.index());
            if let Some(hit) = session.memo_get::<T, S>(key) {
                log::trace!("memo hit {id} at {}", key.1);
                return hit;
            }
            let (result, provisional) =
                session.track_seed_reads(|session| inner.run(state, session));
            if provisional {
                log::trace!("memo skipped {id} at {}: depends on a growing seed", key.1);
            } else if session.memo_put(key, &result) {
                log::trace!("memo stored {id} at {}", key.1);
            }
            result
        })
    }
}
