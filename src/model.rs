//! Parsed instrumentation model: threads, nested timed periods, cache tallies.
//!
//! Built exactly once per run by the scanner (or restored from the index
//! artifact) and read-only afterwards. Periods live in a per-thread arena so
//! the same period can be reached both through the nesting tree and through
//! the flat per-level / self-period listings without shared-ownership cells.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name given to synthesized idle-time periods.
pub const SELF_PERIOD: &str = "#self#";

/// Index into a thread's period arena.
pub type PeriodId = usize;

/// A named, timed, possibly-nested span recorded within a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub timestamp: NaiveDateTime,
    /// `None` while the period is still open in a truncated recording.
    pub duration_ms: Option<u64>,
    pub name: String,
    /// Free-text annotation after the quoted name; may be empty.
    pub details: String,
    /// Nested periods in discovery order. Always empty for `#self#`.
    pub children: Vec<PeriodId>,
}

impl Period {
    /// Composite grouping key: name, plus `", " + details` when present.
    pub fn group_key(&self) -> String {
        if self.details.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.details)
        }
    }
}

/// One logged unit of work, delimited by `>> THREAD … <<` markers.
///
/// Reports call these "Activities".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub name: String,
    /// 1-based inclusive source-line bounds, for raw-log extraction.
    pub start_line: u64,
    pub end_line: u64,
    /// Bounds of *all* timestamped lines seen in the thread, not just
    /// period events.
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    /// `last_timestamp - first_timestamp`. The overall span, not a sum of
    /// top-level periods: idle time counts toward activity duration.
    pub duration_ms: i64,
    /// Arena of every period in the thread (self periods included),
    /// discovery order.
    pub periods: Vec<Period>,
    /// Top-level container of the nesting tree.
    pub roots: Vec<PeriodId>,
    /// Explicit periods grouped by nesting depth (0 = top), discovery order
    /// within each level. Self periods are not listed here.
    pub periods_by_level: BTreeMap<u32, Vec<PeriodId>>,
    /// Every synthesized `#self#` period, regardless of depth.
    pub self_periods: Vec<PeriodId>,
    /// True if any period in the thread was logged `(incomplete)`. Such
    /// threads are dropped from the final model.
    pub incomplete: bool,
}

impl Thread {
    pub fn period(&self, id: PeriodId) -> &Period {
        &self.periods[id]
    }

    /// Resolve a list of arena ids to period references.
    pub fn resolve<'a>(&'a self, ids: &'a [PeriodId]) -> impl Iterator<Item = &'a Period> {
        ids.iter().map(move |&id| &self.periods[id])
    }

    /// Explicit periods across all levels, discovery order within each level.
    pub fn level_periods(&self) -> impl Iterator<Item = &Period> {
        self.periods_by_level
            .values()
            .flat_map(move |ids| ids.iter().map(move |&id| &self.periods[id]))
    }
}

/// Persistence-cache outcome tallies for one object (or one object type).
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheCounts {
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
}

impl CacheCounts {
    pub fn add(&mut self, other: CacheCounts) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.bypasses += other.bypasses;
    }
}

/// Nested tally: object type → object id → outcome counts.
///
/// IndexMap keeps discovery order, which makes tie-breaks in the cache
/// statistics stable and the index artifact deterministic.
pub type CachePoints = IndexMap<String, IndexMap<String, CacheCounts>>;

/// The complete parsed recording.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Retained threads (incomplete ones already dropped), discovery order.
    pub threads: Vec<Thread>,
    pub cache_points: CachePoints,
    /// Min/max over every period's timestamp across all threads, self
    /// periods included, computed before incomplete threads were dropped.
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    /// `last_timestamp - first_timestamp` in seconds; denominator for every
    /// rate in the report.
    pub total_duration_secs: f64,
}
