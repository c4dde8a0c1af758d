//! Line grammar for the instrumentation log.
//!
//! A small ordered set of regex matchers turns each raw line into a tagged
//! event, keeping the scanner's transition logic independent of the text
//! matching. Two layers: whole-line classification (thread marker vs.
//! timestamped line), then classification of the rest of a timestamped line
//! (period open/close, cache point).

use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;

use crate::timestamp::parse_timestamp;

/// Spaces per nesting depth level in period indentation.
const INDENT_WIDTH: usize = 3;

static THREAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>> THREAD\s+(.*?)\s+<<").expect("thread marker regex"));

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}:\d{2}:\d{2}\.\d{3})(.*)$").expect("timestamp regex"));

static PERIOD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ (\s*)period\s+(\d+ms|\(incomplete\))\s+'(.*?)'(.*)\{").expect("period open regex")
});

static PERIOD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ (\s*)\}\s*$").expect("period close regex"));

static CACHE_POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"point\s+'Cache (.+?)'\s+dbId=(.+?)\s+type=(.+?)\s*$").expect("cache point regex")
});

/// Whole-line classification.
#[derive(Debug, PartialEq)]
pub enum LineEvent<'a> {
    /// `>> THREAD <name> <<`
    ThreadStart { name: &'a str },
    /// `HH:MM:SS.mmm<rest>`; the rest goes through [`classify_rest`].
    Timestamped {
        timestamp: NaiveDateTime,
        rest: &'a str,
    },
    Other,
}

/// Classification of the rest of a timestamped line.
#[derive(Debug, PartialEq)]
pub enum PeriodEvent<'a> {
    Open {
        depth: u32,
        /// `None` for the `(incomplete)` duration token.
        duration_ms: Option<u64>,
        name: &'a str,
        details: &'a str,
    },
    Close,
    CachePoint {
        object_type: &'a str,
        db_id: &'a str,
        outcome: CacheOutcome,
    },
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hits,
    Misses,
    Bypasses,
}

impl CacheOutcome {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Hits" => Some(Self::Hits),
            "Misses" => Some(Self::Misses),
            "Bypasses" => Some(Self::Bypasses),
            _ => None,
        }
    }
}

/// Classify a full log line.
///
/// Fails only when a line matches the timestamp shape but the fields are out
/// of range (`25:00:00.000`), which is a grammar violation, fatal upstream.
pub fn classify_line(line: &str) -> Result<LineEvent<'_>> {
    if let Some(caps) = THREAD_RE.captures(line) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return Ok(LineEvent::ThreadStart { name });
    }
    if let Some(caps) = TIMESTAMP_RE.captures(line) {
        let ts = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let timestamp = parse_timestamp(ts)?;
        return Ok(LineEvent::Timestamped { timestamp, rest });
    }
    Ok(LineEvent::Other)
}

/// Classify the rest of a timestamped line, in matcher order: period open,
/// period close, cache point, otherwise unrecognized.
pub fn classify_rest(rest: &str) -> Result<PeriodEvent<'_>> {
    if let Some(caps) = PERIOD_OPEN_RE.captures(rest) {
        let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let token = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let name = caps.get(3).map(|m| m.as_str()).unwrap_or("").trim();
        let details = caps.get(4).map(|m| m.as_str()).unwrap_or("").trim();
        return Ok(PeriodEvent::Open {
            depth: (indent.len() / INDENT_WIDTH) as u32,
            duration_ms: parse_duration_token(token)?,
            name,
            details,
        });
    }
    if PERIOD_CLOSE_RE.is_match(rest) {
        return Ok(PeriodEvent::Close);
    }
    if let Some(caps) = CACHE_POINT_RE.captures(rest) {
        let kind = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let db_id = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let object_type = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        match CacheOutcome::parse(kind) {
            Some(outcome) => {
                return Ok(PeriodEvent::CachePoint {
                    object_type,
                    db_id,
                    outcome,
                })
            }
            None => {
                tracing::debug!(kind, "ignoring unknown cache outcome");
                return Ok(PeriodEvent::Unrecognized);
            }
        }
    }
    Ok(PeriodEvent::Unrecognized)
}

/// `<N>ms` → `Some(N)`, `(incomplete)` → `None`.
fn parse_duration_token(token: &str) -> Result<Option<u64>> {
    if token == "(incomplete)" {
        return Ok(None);
    }
    let Some(digits) = token.strip_suffix("ms") else {
        bail!("malformed duration token {token:?}");
    };
    let ms = digits
        .parse::<u64>()
        .with_context(|| format!("duration out of range: {token:?}"))?;
    Ok(Some(ms))
}
