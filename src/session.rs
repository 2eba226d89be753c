//! Per-parse session state.
//!
//! A [`Session`] owns everything that is scoped to a single top-level parse:
//! the packrat memo table, the table of in-flight left-recursive evaluations,
//! the [`ParseOptions`] in force and some counters. It is created by
//! `Parser::parse` (or by a collaborator calling `run` directly), threaded by
//! `&mut` through every `run` call and dropped afterwards. Nothing in it is
//! global, so concurrent parses never share state.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::parser::ParserId;
use crate::state::{Cursor, ParseResult};

/// Packrat key: which parser, at which byte offset.
pub type MemoKey = (ParserId, usize);

/// Type-erased memo value.
type MemoEntry = Box<dyn Any>;

/// Options for a top-level parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Fail unless the root parser consumes the whole input.
    pub consume_all: bool,
    /// Upper bound on seed-growing passes per left-recursive invocation.
    /// `None` bounds it by the remaining input length plus one.
    pub max_growth_passes: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            consume_all: true,
            max_growth_passes: None,
        }
    }
}

impl ParseOptions {
    pub fn with_consume_all(mut self, consume_all: bool) -> Self {
        self.consume_all = consume_all;
        self
    }

    pub fn with_max_growth_passes(mut self, passes: usize) -> Self {
        self.max_growth_passes = Some(passes);
        self
    }
}

/// Counters collected over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub memo_hits: usize,
    pub memo_misses: usize,
    pub memo_entries: usize,
    /// Body evaluations performed by left-recursive rules, seed pass included.
    pub left_recursion_passes: usize,
    /// Reentrant invocations answered with the current seed.
    pub left_recursion_reentries: usize,
}

/// Where a left-recursive evaluation is in its fixpoint loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPhase {
    /// The first pass is running; the seed is the "no answer yet" failure.
    Seeding,
    /// The seed holds a success and further passes try to extend it.
    Growing,
    /// No pass improved on the seed; the entry is about to be retired.
    Resolved,
}

/// The in-flight record of a left-recursive rule at one position.
#[derive(Debug, Clone)]
pub struct LeftRecursionEntry<T, S> {
    pub seed: ParseResult<T, S>,
    pub phase: GrowthPhase,
    /// Number of evaluations already in flight when this one began.
    pub depth: usize,
}

/// Scoped state for one parse.
pub struct Session {
    options: ParseOptions,
    memo: HashMap<MemoKey, MemoEntry>,
    left_recursion: HashMap<MemoKey, Box<dyn Any>>,
    /// Smallest `depth` of any seed handed out inside the current
    /// [`Session::track_seed_reads`] call.
    shallowest_seed_read: Option<usize>,
    stats: SessionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("memo_entries", &self.memo.len())
            .field("active_left_recursions", &self.left_recursion.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            memo: HashMap::new(),
            left_recursion: HashMap::new(),
            shallowest_seed_read: None,
            stats: SessionStats::default(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            memo_entries: self.memo.len(),
            ..self.stats
        }
    }

    // ------------------------------------------------------------------
    // Memo table
    // ------------------------------------------------------------------

    /// Looks up a memoized result, counting the hit or miss.
    pub fn memo_get<T, S>(&mut self, key: MemoKey) -> Option<ParseResult<T, S>>
    where
        T: Clone + 'static,
        S: Cursor,
    {
        let hit = self
            .memo
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<ParseResult<T, S>>())
            .cloned();
        match hit {
            Some(_) => self.stats.memo_hits += 1,
            None => self.stats.memo_misses += 1,
        }
        hit
    }

    /// Whether a memo entry exists for `key`, without touching the counters.
    pub fn memo_contains(&self, key: &MemoKey) -> bool {
        self.memo.contains_key(key)
    }

    /// Stores a result unless the key is already written. Returns whether the
    /// entry was written.
    ///
    /// Callers must not store results marked provisional by
    /// [`track_seed_reads`](Self::track_seed_reads).
    pub fn memo_put<T, S>(&mut self, key: MemoKey, result: &ParseResult<T, S>) -> bool
    where
        T: Clone + 'static,
        S: Cursor,
    {
        if self.memo.contains_key(&key) {
            return false;
        }
        self.memo.insert(key, Box::new(result.clone()));
        true
    }

    /// Runs `evaluate` and reports whether it read the seed of a
    /// left-recursive evaluation that was already in progress when it
    /// started. Such a result is provisional and must not be memoized.
    /// Seeds of evaluations begun and finished inside `evaluate` do not count.
    pub fn track_seed_reads<R>(&mut self, evaluate: impl FnOnce(&mut Session) -> R) -> (R, bool) {
        let depth = self.left_recursion.len();
        let outer = self.shallowest_seed_read.take();
        let result = evaluate(self);
        let read = self.shallowest_seed_read;
        self.shallowest_seed_read = match (outer, read) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        (result, read.is_some_and(|d| d < depth))
    }

    // ------------------------------------------------------------------
    // Left-recursion table
    // ------------------------------------------------------------------

    /// Whether any left-recursive evaluation is currently in progress.
    pub fn left_recursion_active(&self) -> bool {
        !self.left_recursion.is_empty()
    }

    /// The current seed for `key`, if that rule is being evaluated there.
    pub fn left_recursion_seed<T, S>(&mut self, key: MemoKey) -> Option<ParseResult<T, S>>
    where
        T: Clone + 'static,
        S: Cursor,
    {
        let (seed, depth) = self
            .left_recursion
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<LeftRecursionEntry<T, S>>())
            .map(|entry| (entry.seed.clone(), entry.depth))?;
        self.stats.left_recursion_reentries += 1;
        let shallowest = self.shallowest_seed_read.map_or(depth, |d| d.min(depth));
        self.shallowest_seed_read = Some(shallowest);
        Some(seed)
    }

    pub(crate) fn left_recursion_begin<T, S>(&mut self, key: MemoKey, seed: ParseResult<T, S>)
    where
        T: 'static,
        S: Cursor,
    {
        let entry = LeftRecursionEntry {
            seed,
            phase: GrowthPhase::Seeding,
            depth: self.left_recursion.len(),
        };
        self.left_recursion.insert(key, Box::new(entry));
    }

    pub(crate) fn left_recursion_phase<T, S>(&self, key: MemoKey) -> Option<GrowthPhase>
    where
        T: 'static,
        S: Cursor,
    {
        self.left_recursion
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<LeftRecursionEntry<T, S>>())
            .map(|entry| entry.phase)
    }

    /// Borrows the current seed without counting a reentry.
    pub(crate) fn left_recursion_peek<T, S>(&self, key: MemoKey) -> Option<&ParseResult<T, S>>
    where
        T: 'static,
        S: Cursor,
    {
        self.left_recursion
            .get(&key)
            .and_then(|entry| entry.downcast_ref::<LeftRecursionEntry<T, S>>())
            .map(|entry| &entry.seed)
    }

    pub(crate) fn left_recursion_grow<T, S>(&mut self, key: MemoKey, seed: ParseResult<T, S>)
    where
        T: 'static,
        S: Cursor,
    {
        if let Some(entry) = self
            .left_recursion
            .get_mut(&key)
            .and_then(|entry| entry.downcast_mut::<LeftRecursionEntry<T, S>>())
        {
            entry.seed = seed;
            entry.phase = GrowthPhase::Growing;
        }
    }

    /// Retires the entry for `key`, returning it marked as resolved.
    pub(crate) fn left_recursion_finish<T, S>(
        &mut self,
        key: MemoKey,
    ) -> Option<LeftRecursionEntry<T, S>>
    where
        T: 'static,
        S: Cursor,
    {
        let entry = self.left_recursion.remove(&key)?;
        let mut entry = *entry.downcast::<LeftRecursionEntry<T, S>>().ok()?;
        entry.phase = GrowthPhase::Resolved;
        Some(entry)
    }

    pub(crate) fn count_left_recursion_pass(&mut self) {
        self.stats.left_recursion_passes += 1;
    }
}
