//! Stateful log scanner.
//!
//! Consumes the instrumentation log line by line and reconstructs the nested
//! timing structure of each execution thread: explicit periods from the
//! brace-delimited grammar, plus synthesized `#self#` periods covering the
//! gaps between recorded instants. Single pass, single active thread context,
//! an explicit stack of open child containers instead of nested lists.
//!
//! Any error while processing a recognized timestamped line is fatal for the
//! whole run: the scan aborts and reports the offending line. Unrecognized
//! lines are skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::lines::{classify_line, classify_rest, CacheOutcome, LineEvent, PeriodEvent};
use crate::model::{CachePoints, Model, Period, PeriodId, Thread, SELF_PERIOD};
use crate::timestamp::delta_ms;

/// Fatal scan failure, carrying the offending source line.
#[derive(Debug, Error)]
#[error("invalid line {line_number}: {line:?}")]
pub struct ScanError {
    pub line_number: u64,
    pub line: String,
    #[source]
    pub source: anyhow::Error,
}

/// Handle to the children container currently accepting new periods.
enum Container {
    Root,
    Node(PeriodId),
}

/// Parse context for the thread currently being read.
struct ThreadCtx {
    name: String,
    start_line: u64,
    first_timestamp: Option<NaiveDateTime>,
    last_timestamp: Option<NaiveDateTime>,
    /// Last recorded period-event instant, for self-period synthesis.
    /// Distinct from `last_timestamp`, which tracks every timestamped line.
    last_instant: Option<NaiveDateTime>,
    periods: Vec<Period>,
    roots: Vec<PeriodId>,
    periods_by_level: BTreeMap<u32, Vec<PeriodId>>,
    self_periods: Vec<PeriodId>,
    /// Open containers, bottom = the top-level list. An unbalanced `}` can
    /// pop the root; any period event after that is a grammar violation.
    stack: Vec<Container>,
    incomplete: bool,
}

impl ThreadCtx {
    fn new(name: &str, start_line: u64) -> Self {
        Self {
            name: name.to_string(),
            start_line,
            first_timestamp: None,
            last_timestamp: None,
            last_instant: None,
            periods: Vec::new(),
            roots: Vec::new(),
            periods_by_level: BTreeMap::new(),
            self_periods: Vec::new(),
            stack: vec![Container::Root],
            incomplete: false,
        }
    }

    /// Append a period to the arena and to the currently open container.
    fn push_period(&mut self, period: Period) -> Result<PeriodId> {
        let container = match self.stack.last() {
            Some(c) => c,
            None => bail!("period event after the top-level container was closed"),
        };
        let id = self.periods.len();
        match *container {
            Container::Root => {
                self.periods.push(period);
                self.roots.push(id);
            }
            Container::Node(parent) => {
                self.periods.push(period);
                self.periods[parent].children.push(id);
            }
        }
        Ok(id)
    }

    /// Synthesize a `#self#` period covering the gap since the last recorded
    /// instant, if strictly positive. Runs immediately before every period
    /// open and close; the last instant advances unconditionally.
    fn record_self_period(&mut self, timestamp: NaiveDateTime) -> Result<()> {
        if let Some(last) = self.last_instant {
            let gap = delta_ms(last, timestamp);
            if gap > 0 {
                let id = self.push_period(Period {
                    timestamp: last,
                    duration_ms: Some(gap as u64),
                    name: SELF_PERIOD.to_string(),
                    details: String::new(),
                    children: Vec::new(),
                })?;
                self.self_periods.push(id);
            }
        }
        self.last_instant = Some(timestamp);
        Ok(())
    }

    fn open(
        &mut self,
        timestamp: NaiveDateTime,
        depth: u32,
        duration_ms: Option<u64>,
        name: &str,
        details: &str,
    ) -> Result<()> {
        self.record_self_period(timestamp)?;
        if duration_ms.is_none() {
            self.incomplete = true;
        }
        let id = self.push_period(Period {
            timestamp,
            duration_ms,
            name: name.to_string(),
            details: details.to_string(),
            children: Vec::new(),
        })?;
        self.periods_by_level.entry(depth).or_default().push(id);
        self.stack.push(Container::Node(id));
        Ok(())
    }

    fn close(&mut self, timestamp: NaiveDateTime) -> Result<()> {
        self.record_self_period(timestamp)?;
        if self.stack.pop().is_none() {
            bail!("unbalanced '}}' with no open container");
        }
        Ok(())
    }

    /// Seal the context into a Thread. A thread that never saw a timestamped
    /// line is discarded.
    fn into_thread(self, end_line: u64) -> Option<Thread> {
        let first = self.first_timestamp?;
        let last = self.last_timestamp.unwrap_or(first);
        Some(Thread {
            name: self.name,
            start_line: self.start_line,
            end_line,
            first_timestamp: first,
            last_timestamp: last,
            duration_ms: delta_ms(first, last),
            periods: self.periods,
            roots: self.roots,
            periods_by_level: self.periods_by_level,
            self_periods: self.self_periods,
            incomplete: self.incomplete,
        })
    }
}

/// The scanner owns all mutable state of a scan; once [`Scanner::finish`]
/// returns, the model is read-only.
pub struct Scanner {
    threads: Vec<Thread>,
    cache_points: CachePoints,
    current: Option<ThreadCtx>,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            threads: Vec::new(),
            cache_points: CachePoints::default(),
            current: None,
        }
    }

    /// Scan a whole log file. Lines are 1-indexed.
    pub fn scan_file(path: &Path) -> Result<Model> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let reader = BufReader::with_capacity(64 * 1024, file);

        let mut scanner = Scanner::new();
        let mut line_number = 0u64;
        for line in reader.lines() {
            let line = line.with_context(|| format!("read error in {}", path.display()))?;
            line_number += 1;
            scanner.feed_line(line_number, &line)?;
        }
        scanner.finish(line_number)
    }

    /// Process one source line.
    pub fn feed_line(&mut self, line_number: u64, line: &str) -> Result<(), ScanError> {
        self.process(line_number, line).map_err(|source| ScanError {
            line_number,
            line: line.to_string(),
            source,
        })
    }

    fn process(&mut self, line_number: u64, line: &str) -> Result<()> {
        match classify_line(line)? {
            LineEvent::ThreadStart { name } => {
                self.close_current(line_number.saturating_sub(1));
                self.current = Some(ThreadCtx::new(name, line_number));
            }
            LineEvent::Timestamped { timestamp, rest } => {
                let ctx = self
                    .current
                    .as_mut()
                    .context("timestamped line before any thread marker")?;
                if ctx.first_timestamp.is_none() {
                    ctx.first_timestamp = Some(timestamp);
                }
                ctx.last_timestamp = Some(timestamp);

                match classify_rest(rest)? {
                    PeriodEvent::Open {
                        depth,
                        duration_ms,
                        name,
                        details,
                    } => ctx.open(timestamp, depth, duration_ms, name, details)?,
                    PeriodEvent::Close => ctx.close(timestamp)?,
                    PeriodEvent::CachePoint {
                        object_type,
                        db_id,
                        outcome,
                    } => {
                        let counts = self
                            .cache_points
                            .entry(object_type.to_string())
                            .or_default()
                            .entry(db_id.to_string())
                            .or_default();
                        match outcome {
                            CacheOutcome::Hits => counts.hits += 1,
                            CacheOutcome::Misses => counts.misses += 1,
                            CacheOutcome::Bypasses => counts.bypasses += 1,
                        }
                    }
                    PeriodEvent::Unrecognized => {}
                }
            }
            LineEvent::Other => {}
        }
        Ok(())
    }

    fn close_current(&mut self, end_line: u64) {
        if let Some(ctx) = self.current.take() {
            match ctx.into_thread(end_line) {
                Some(thread) => self.threads.push(thread),
                None => tracing::debug!("discarding thread with no timestamped lines"),
            }
        }
    }

    /// Close the final thread, compute global bounds, and drop incomplete
    /// threads. Bounds span every period's timestamp (self periods included)
    /// across all threads, incomplete ones still counted at this point.
    pub fn finish(mut self, total_lines: u64) -> Result<Model> {
        self.close_current(total_lines);

        let mut first: Option<NaiveDateTime> = None;
        let mut last: Option<NaiveDateTime> = None;
        for thread in &self.threads {
            for period in &thread.periods {
                let ts = period.timestamp;
                if first.map_or(true, |f| ts < f) {
                    first = Some(ts);
                }
                if last.map_or(true, |l| ts > l) {
                    last = Some(ts);
                }
            }
        }
        let (first, last) = match (first, last) {
            (Some(f), Some(l)) => (f, l),
            _ => bail!("log contains no timed periods"),
        };

        let dropped = self.threads.iter().filter(|t| t.incomplete).count();
        if dropped > 0 {
            tracing::info!(dropped, "excluding incomplete threads from the model");
        }
        let threads: Vec<Thread> = self.threads.into_iter().filter(|t| !t.incomplete).collect();

        Ok(Model {
            threads,
            cache_points: self.cache_points,
            first_timestamp: first,
            last_timestamp: last,
            total_duration_secs: delta_ms(first, last) as f64 / 1000.0,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
