//! Aggregate queries over a scanned model.
//!
//! Everything here is a pure function over `&Model` (or a part of it); the
//! model is never mutated once the scanner hands it over. Grouping preserves
//! first-seen order so that equal totals keep a stable, reproducible order
//! across runs.

use indexmap::IndexMap;

use crate::model::{CacheCounts, Model, Period, PeriodId, Thread, SELF_PERIOD};

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Count / total / average / median / max over a set of durations.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total_ms: u64,
    /// `round(total / count)`.
    pub average_ms: u64,
    /// Median of the sorted durations; even-sized sets average the two
    /// middle elements.
    pub median_ms: f64,
    pub max_ms: u64,
}

/// Median of a duration set. Callers guard against empty input.
pub fn median(durations: &[u64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let len = sorted.len();
    (sorted[(len - 1) / 2] + sorted[len / 2]) as f64 / 2.0
}

/// Summarize a set of durations; `None` when the set is empty.
pub fn summarize_durations(durations: &[u64]) -> Option<Summary> {
    if durations.is_empty() {
        return None;
    }
    let count = durations.len();
    let total: u64 = durations.iter().sum();
    Some(Summary {
        count,
        total_ms: total,
        average_ms: (total as f64 / count as f64).round() as u64,
        median_ms: median(durations),
        max_ms: durations.iter().copied().max().unwrap_or(0),
    })
}

fn durations_of<'a>(periods: impl IntoIterator<Item = &'a Period>) -> Vec<u64> {
    periods
        .into_iter()
        .map(|p| p.duration_ms.unwrap_or(0))
        .collect()
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Statistics for one composite-key group of periods.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: String,
    pub summary: Summary,
}

/// Group periods by composite key (name, plus `", " + details` when details
/// are non-empty) and summarize each group. Groups come out sorted by total
/// duration descending; ties keep first-seen order.
pub fn group_stats<'a>(periods: impl IntoIterator<Item = &'a Period>) -> Vec<GroupStats> {
    let mut groups: IndexMap<String, Vec<u64>> = IndexMap::new();
    for p in periods {
        groups
            .entry(p.group_key())
            .or_default()
            .push(p.duration_ms.unwrap_or(0));
    }
    let mut out: Vec<GroupStats> = groups
        .into_iter()
        .filter_map(|(key, durations)| {
            summarize_durations(&durations).map(|summary| GroupStats { key, summary })
        })
        .collect();
    out.sort_by(|a, b| b.summary.total_ms.cmp(&a.summary.total_ms));
    out
}

// ---------------------------------------------------------------------------
// Depth-limited profile tree
// ---------------------------------------------------------------------------

/// One grouped line of a thread's detailed profile, with its nested levels.
#[derive(Debug, PartialEq)]
pub struct ProfileEntry {
    pub key: String,
    pub summary: Summary,
    pub children: Vec<ProfileEntry>,
}

/// Recursively group a thread's periods: statistics per group at this level,
/// then descend into the union of each group's children. Stops at
/// `max_depth` levels (unbounded when `None`), and suppresses a level whose
/// only group is `#self#`; that time is already counted at the parent.
pub fn profile_tree(thread: &Thread, ids: &[PeriodId], max_depth: Option<u32>) -> Vec<ProfileEntry> {
    profile_level(thread, ids, 0, max_depth)
}

fn profile_level(
    thread: &Thread,
    ids: &[PeriodId],
    level: u32,
    max_depth: Option<u32>,
) -> Vec<ProfileEntry> {
    if max_depth.is_some_and(|max| level >= max) || ids.is_empty() {
        return Vec::new();
    }

    let mut groups: IndexMap<String, Vec<PeriodId>> = IndexMap::new();
    for &id in ids {
        groups
            .entry(thread.period(id).group_key())
            .or_default()
            .push(id);
    }
    if groups.len() == 1 && groups.keys().next().map(String::as_str) == Some(SELF_PERIOD) {
        return Vec::new();
    }

    let mut entries: Vec<(String, Vec<PeriodId>)> = groups.into_iter().collect();
    entries.sort_by_key(|(_, members)| {
        std::cmp::Reverse(
            members
                .iter()
                .map(|&id| thread.period(id).duration_ms.unwrap_or(0))
                .sum::<u64>(),
        )
    });

    entries
        .into_iter()
        .filter_map(|(key, members)| {
            let durations = durations_of(thread.resolve(&members));
            let summary = summarize_durations(&durations)?;
            let nested: Vec<PeriodId> = members
                .iter()
                .flat_map(|&id| thread.period(id).children.iter().copied())
                .collect();
            Some(ProfileEntry {
                key,
                summary,
                children: profile_level(thread, &nested, level + 1, max_depth),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// Threads whose name starts with `prefix`, by duration descending (stable:
/// ties keep discovery order), truncated to `count`.
pub fn top_threads<'a>(model: &'a Model, prefix: &str, count: usize) -> Vec<&'a Thread> {
    let mut selected: Vec<&Thread> = model
        .threads
        .iter()
        .filter(|t| t.name.starts_with(prefix))
        .collect();
    selected.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
    selected.truncate(count);
    selected
}

/// A thread's self periods by duration descending, truncated to `count`.
pub fn top_self_periods<'a>(thread: &'a Thread, count: usize) -> Vec<&'a Period> {
    let mut selected: Vec<&Period> = thread.resolve(&thread.self_periods).collect();
    selected.sort_by(|a, b| {
        b.duration_ms
            .unwrap_or(0)
            .cmp(&a.duration_ms.unwrap_or(0))
    });
    selected.truncate(count);
    selected
}

// ---------------------------------------------------------------------------
// Cache statistics
// ---------------------------------------------------------------------------

/// Outcome totals per object type, sorted by misses descending.
pub fn cache_by_type(model: &Model) -> Vec<(String, CacheCounts)> {
    let mut rows: Vec<(String, CacheCounts)> = model
        .cache_points
        .iter()
        .map(|(object_type, ids)| {
            let mut sum = CacheCounts::default();
            for counts in ids.values() {
                sum.add(*counts);
            }
            (object_type.clone(), sum)
        })
        .collect();
    rows.sort_by(|a, b| b.1.misses.cmp(&a.1.misses));
    rows
}

/// Per-instance (`type.id`) outcome counts with at least one miss, sorted by
/// misses descending, truncated to `count`.
pub fn cache_top_miss_instances(model: &Model, count: usize) -> Vec<(String, CacheCounts)> {
    let mut rows: Vec<(String, CacheCounts)> = model
        .cache_points
        .iter()
        .flat_map(|(object_type, ids)| {
            ids.iter()
                .map(move |(id, counts)| (format!("{object_type}.{id}"), *counts))
        })
        .collect();
    rows.sort_by(|a, b| b.1.misses.cmp(&a.1.misses));
    rows.retain(|(_, counts)| counts.misses > 0);
    rows.truncate(count);
    rows
}

/// Grand totals across every object type and id.
pub fn cache_totals(model: &Model) -> CacheCounts {
    let mut sum = CacheCounts::default();
    for ids in model.cache_points.values() {
        for counts in ids.values() {
            sum.add(*counts);
        }
    }
    sum
}

/// Cache misses and bypasses both cost a database round trip; per second of
/// recording they measure wasted persistence traffic.
pub fn wasted_transactions_per_sec(model: &Model) -> f64 {
    let totals = cache_totals(model);
    (totals.misses + totals.bypasses) as f64 / model.total_duration_secs
}

// ---------------------------------------------------------------------------
// Named transactions
// ---------------------------------------------------------------------------

/// Predicate selecting the periods of one named transaction.
#[derive(Debug, Clone, Copy)]
pub enum TxMatcher {
    NamePrefix(&'static str),
    NamePrefixWithDetail {
        prefix: &'static str,
        detail: &'static str,
    },
    NameIn(&'static [&'static str]),
}

impl TxMatcher {
    pub fn matches(&self, period: &Period) -> bool {
        match *self {
            TxMatcher::NamePrefix(prefix) => period.name.starts_with(prefix),
            TxMatcher::NamePrefixWithDetail { prefix, detail } => {
                period.name.starts_with(prefix) && period.details.contains(detail)
            }
            TxMatcher::NameIn(names) => names.contains(&period.name.as_str()),
        }
    }
}

pub struct TransactionSpec {
    pub label: &'static str,
    pub matcher: TxMatcher,
}

const DO_JOB: &str = "Do Job";

/// The key performance points of a business-process engine run: engine task
/// periods, execution-context persistence, raw persistence-service calls,
/// and the service-step worker breakdown.
pub const TRANSACTIONS: &[TransactionSpec] = &[
    TransactionSpec {
        label: "Task: Resume Workflow Engine",
        matcher: TxMatcher::NamePrefix("Resume Workflow Engine"),
    },
    TransactionSpec {
        label: "Task: Load Execution Context",
        matcher: TxMatcher::NamePrefix("Load Execution Context"),
    },
    TransactionSpec {
        label: "Task: Save Execution Context",
        matcher: TxMatcher::NamePrefix("Save Execution Context"),
    },
    TransactionSpec {
        label: "BPD: Load Execution Context",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: "findByPrimaryKey",
            detail: "type=BPDInstanceData",
        },
    },
    TransactionSpec {
        label: "BPD: Save Execution Context",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: "save",
            detail: "type=BPDInstanceData",
        },
    },
    TransactionSpec {
        label: "PersistenceServices (DB Access)",
        matcher: TxMatcher::NameIn(&[
            "findByPrimaryKey",
            "findQuietlyByPrimaryKey",
            "bulkFindByPrimaryKey",
            "findByFilter",
            "findSingleByFilter",
            "findAll",
            "save",
        ]),
    },
    TransactionSpec {
        label: "    - findByPrimaryKey",
        matcher: TxMatcher::NamePrefix("findByPrimaryKey"),
    },
    TransactionSpec {
        label: "    - bulkFindByPrimaryKey",
        matcher: TxMatcher::NamePrefix("bulkFindByPrimaryKey"),
    },
    TransactionSpec {
        label: "    - findByFilter",
        matcher: TxMatcher::NamePrefix("findByFilter"),
    },
    TransactionSpec {
        label: "    - save",
        matcher: TxMatcher::NamePrefix("save"),
    },
    TransactionSpec {
        label: "Do Job (Service Step Workers)",
        matcher: TxMatcher::NamePrefix(DO_JOB),
    },
    TransactionSpec {
        label: "    - ScriptWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.twscript.worker.ScriptWorker",
        },
    },
    TransactionSpec {
        label: "    - SwitchWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.twswitch.worker.SwitchWorker",
        },
    },
    TransactionSpec {
        label: "    - CoachWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.coach.worker.CoachWorker",
        },
    },
    TransactionSpec {
        label: "    - CoachNGWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.coachng.worker.CoachNGWorker",
        },
    },
    TransactionSpec {
        label: "    - SubProcessWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.subprocess.worker.SubProcessWorker",
        },
    },
    TransactionSpec {
        label: "    - ExitPointWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.exitpoint.worker.ExitPointWorker",
        },
    },
    TransactionSpec {
        label: "    - JavaConnectorWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.javaconnector.worker.JavaConnectorWorker",
        },
    },
    TransactionSpec {
        label: "    - WSConnectorWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.wsconnector.worker.WSConnectorWorker",
        },
    },
    TransactionSpec {
        label: "    - SCAConnectorWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.scaconnector.worker.SCAConnectorWorker",
        },
    },
    TransactionSpec {
        label: "    - ILOGDecisionWorker",
        matcher: TxMatcher::NamePrefixWithDetail {
            prefix: DO_JOB,
            detail: "Worker=com.lombardisoftware.component.ilogrule.worker.ILOGDecisionWorker",
        },
    },
    TransactionSpec {
        label: "Eval Script",
        matcher: TxMatcher::NamePrefix("Eval Script"),
    },
];

/// One rendered transaction line. `stats` is `None` when nothing matched;
/// the row still appears, as placeholders.
pub struct TransactionRow {
    pub label: &'static str,
    pub stats: Option<(Summary, f64)>,
}

/// Evaluate every named transaction over the explicit periods of all threads
/// and levels. TPS divides match count by the recording duration.
pub fn transaction_rows(model: &Model) -> Vec<TransactionRow> {
    let periods: Vec<&Period> = model.threads.iter().flat_map(|t| t.level_periods()).collect();
    TRANSACTIONS
        .iter()
        .map(|spec| {
            let durations: Vec<u64> = periods
                .iter()
                .filter(|p| spec.matcher.matches(p))
                .map(|p| p.duration_ms.unwrap_or(0))
                .collect();
            let stats = summarize_durations(&durations)
                .map(|s| {
                    let tps = s.count as f64 / model.total_duration_secs;
                    (s, tps)
                });
            TransactionRow {
                label: spec.label,
                stats,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn scan_str(log: &str) -> Model {
        let mut scanner = Scanner::new();
        let mut line_number = 0u64;
        for line in log.lines() {
            line_number += 1;
            scanner.feed_line(line_number, line).unwrap();
        }
        scanner.finish(line_number).unwrap()
    }

    fn period(name: &str, details: &str, duration_ms: u64) -> Period {
        Period {
            timestamp: crate::timestamp::parse_timestamp("10:00:00.000").unwrap(),
            duration_ms: Some(duration_ms),
            name: name.to_string(),
            details: details.to_string(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[100, 200, 300]), 200.0);
        assert_eq!(median(&[100, 200, 300, 400]), 250.0);
        assert_eq!(median(&[7]), 7.0);
    }

    #[test]
    fn test_summarize_durations() {
        let s = summarize_durations(&[10, 20, 40]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.total_ms, 70);
        assert_eq!(s.average_ms, 23); // 23.33 rounds down
        assert_eq!(s.median_ms, 20.0);
        assert_eq!(s.max_ms, 40);

        assert!(summarize_durations(&[]).is_none());
    }

    #[test]
    fn test_group_key_includes_details() {
        let periods = [
            period("save", "type=Foo", 10),
            period("save", "", 20),
            period("save", "type=Foo", 30),
        ];
        let groups = group_stats(periods.iter());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "save, type=Foo");
        assert_eq!(groups[0].summary.total_ms, 40);
        assert_eq!(groups[1].key, "save");
    }

    #[test]
    fn test_group_sort_is_stable_and_repeatable() {
        // Two groups with equal totals keep first-seen order, twice.
        let periods = [
            period("b", "", 50),
            period("a", "", 50),
            period("c", "", 90),
        ];
        let first: Vec<String> = group_stats(periods.iter()).into_iter().map(|g| g.key).collect();
        let second: Vec<String> = group_stats(periods.iter()).into_iter().map(|g| g.key).collect();
        assert_eq!(first, vec!["c", "b", "a"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_threads_ranking() {
        let model = scan_str(
            ">> THREAD WebContainer : 0 <<\n\
             10:00:00.000 period 1ms 'a'{\n\
             10:00:00.300 }\n\
             >> THREAD WebContainer : 1 <<\n\
             10:00:01.000 period 1ms 'a'{\n\
             10:00:01.100 }\n\
             >> THREAD WebContainer : 2 <<\n\
             10:00:02.000 period 1ms 'a'{\n\
             10:00:02.200 }\n\
             >> THREAD ThreadPool worker : 9 <<\n\
             10:00:03.000 period 1ms 'a'{\n\
             10:00:03.900 }\n",
        );

        let top = top_threads(&model, "WebContainer", 2);
        let durations: Vec<i64> = top.iter().map(|t| t.duration_ms).collect();
        assert_eq!(durations, vec![300, 200]);
        assert_eq!(top[0].name, "WebContainer : 0");
        assert_eq!(top[1].name, "WebContainer : 2");

        // Prefix filter excludes the worker thread entirely.
        assert!(top_threads(&model, "WebContainer", 10).len() == 3);
    }

    #[test]
    fn test_top_threads_ties_keep_discovery_order() {
        let model = scan_str(
            ">> THREAD W1 <<\n\
             10:00:00.000 period 1ms 'a'{\n\
             10:00:00.100 }\n\
             >> THREAD W2 <<\n\
             10:00:01.000 period 1ms 'a'{\n\
             10:00:01.100 }\n",
        );
        let top = top_threads(&model, "W", 2);
        assert_eq!(top[0].name, "W1");
        assert_eq!(top[1].name, "W2");
    }

    #[test]
    fn test_top_self_periods() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 300ms 'a'{\n\
             10:00:00.010    period 5ms 'b'{\n\
             10:00:00.015    }\n\
             10:00:00.100    period 5ms 'b'{\n\
             10:00:00.105    }\n\
             10:00:00.300 }\n",
        );
        let t = &model.threads[0];
        // Gaps: 10 (before first b), 5 (inside first b), 85, 5, 195.
        let top = top_self_periods(t, 3);
        let durations: Vec<u64> = top.iter().map(|p| p.duration_ms.unwrap_or(0)).collect();
        assert_eq!(durations, vec![195, 85, 10]);
    }

    #[test]
    fn test_cache_stats_reconcile() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 1ms 'a'{\n\
             10:00:00.001   point 'Cache Hits' dbId=1 type=Foo\n\
             10:00:00.002   point 'Cache Misses' dbId=1 type=Foo\n\
             10:00:00.003   point 'Cache Misses' dbId=2 type=Foo\n\
             10:00:00.004   point 'Cache Bypasses' dbId=9 type=Bar\n\
             10:00:00.005   point 'Cache Hits' dbId=9 type=Bar\n\
             10:00:01.000 }\n",
        );

        let by_type = cache_by_type(&model);
        let by_instance: Vec<(String, CacheCounts)> = model
            .cache_points
            .iter()
            .flat_map(|(ty, ids)| ids.iter().map(move |(id, c)| (format!("{ty}.{id}"), *c)))
            .collect();
        let totals = cache_totals(&model);

        let sum_types: u64 = by_type.iter().map(|(_, c)| c.hits + c.misses + c.bypasses).sum();
        let sum_instances: u64 = by_instance.iter().map(|(_, c)| c.hits + c.misses + c.bypasses).sum();
        assert_eq!(sum_types, sum_instances);
        assert_eq!(totals.hits, 2);
        assert_eq!(totals.misses, 2);
        assert_eq!(totals.bypasses, 1);

        // Foo has the most misses, so it sorts first.
        assert_eq!(by_type[0].0, "Foo");
    }

    #[test]
    fn test_cache_top_miss_instances_filters_zero_misses() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 1ms 'a'{\n\
             10:00:00.001   point 'Cache Hits' dbId=1 type=Foo\n\
             10:00:00.002   point 'Cache Misses' dbId=2 type=Foo\n\
             10:00:01.000 }\n",
        );
        let rows = cache_top_miss_instances(&model, 10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "Foo.2");
    }

    #[test]
    fn test_wasted_transactions_per_sec() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 1ms 'a'{\n\
             10:00:00.001   point 'Cache Misses' dbId=1 type=Foo\n\
             10:00:00.002   point 'Cache Bypasses' dbId=1 type=Foo\n\
             10:00:00.003   point 'Cache Hits' dbId=1 type=Foo\n\
             10:00:02.000 period 1ms 'b'{\n\
             10:00:02.001 }\n\
             10:00:02.001 }\n",
        );
        assert_eq!(model.total_duration_secs, 2.0);
        assert_eq!(wasted_transactions_per_sec(&model), 1.0);
    }

    #[test]
    fn test_transaction_rows_match_and_placeholder() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 40ms 'save' type=BPDInstanceData id=7{\n\
             10:00:00.040 }\n\
             10:00:00.100 period 10ms 'findByPrimaryKey' type=Other{\n\
             10:00:00.110 }\n\
             10:00:02.000 period 20ms 'saveAttachment' type=Other{\n\
             10:00:02.020 }\n",
        );
        let rows = transaction_rows(&model);

        let bpd_save = rows.iter().find(|r| r.label == "BPD: Save Execution Context").unwrap();
        let (summary, tps) = bpd_save.stats.as_ref().unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_ms, 40);
        assert_eq!(*tps, 0.5);

        // Prefix row counts both 'save' and 'saveAttachment'; the exact-name
        // persistence set counts only 'save' and 'findByPrimaryKey'.
        let save_prefix = rows.iter().find(|r| r.label == "    - save").unwrap();
        assert_eq!(save_prefix.stats.as_ref().unwrap().0.count, 2);
        let persistence = rows
            .iter()
            .find(|r| r.label == "PersistenceServices (DB Access)")
            .unwrap();
        assert_eq!(persistence.stats.as_ref().unwrap().0.count, 2);

        // No Do Job periods at all: the row is present with no stats.
        let do_job = rows.iter().find(|r| r.label == "Do Job (Service Step Workers)").unwrap();
        assert!(do_job.stats.is_none());

        assert_eq!(rows.len(), TRANSACTIONS.len());
    }

    #[test]
    fn test_profile_tree_groups_and_suppresses_pure_self_levels() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 100ms 'outer'{\n\
             10:00:00.010    period 30ms 'inner' d=1{\n\
             10:00:00.040    }\n\
             10:00:00.100 }\n",
        );
        let t = &model.threads[0];
        let tree = profile_tree(t, &t.roots, None);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].key, "outer");
        assert_eq!(tree[0].summary.total_ms, 100);

        // Level 1 groups: the two self gaps (10+60) outrank inner (30).
        let level1: Vec<&str> = tree[0].children.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(level1, vec![SELF_PERIOD, "inner, d=1"]);
        assert_eq!(tree[0].children[0].summary.total_ms, 70);

        // inner's only child is its self time: the level is suppressed.
        let inner = &tree[0].children[1];
        assert!(inner.children.is_empty());
    }

    #[test]
    fn test_profile_tree_depth_limit() {
        let model = scan_str(
            ">> THREAD W <<\n\
             10:00:00.000 period 100ms 'outer'{\n\
             10:00:00.010    period 30ms 'inner'{\n\
             10:00:00.040    }\n\
             10:00:00.100 }\n",
        );
        let t = &model.threads[0];
        let tree = profile_tree(t, &t.roots, Some(1));
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }
}
