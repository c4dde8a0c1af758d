//! Raw-log extraction for ranked activities.
//!
//! Copies each selected thread's original source lines into its own file
//! beside the log, named after the sanitized thread name and its ActivityID
//! (start line). One sequential pass over the log, ranges visited in
//! ascending start-line order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::Thread;

static SANITIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^a-z0-9\-]+").expect("sanitize regex"));

/// `<log>.<sanitized name>.<start line>.thread.txt`
fn output_path(log: &Path, thread: &Thread) -> PathBuf {
    let sanitized = SANITIZE_RE.replace_all(&thread.name, "_");
    let mut name = log.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}.thread.txt", sanitized, thread.start_line));
    log.with_file_name(name)
}

/// Dump the raw log range of every given thread. Returns the written paths.
pub fn dump_threads(log: &Path, threads: &[&Thread]) -> Result<Vec<PathBuf>> {
    let mut targets: Vec<&Thread> = threads.to_vec();
    targets.sort_by_key(|t| t.start_line);

    let file = File::open(log).with_context(|| format!("failed to open {}", log.display()))?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    let mut written = Vec::new();
    let mut out: Option<BufWriter<File>> = None;
    let mut target_idx = 0;
    let mut line_number = 0u64;

    for line in reader.lines() {
        let line = line.with_context(|| format!("read error in {}", log.display()))?;
        line_number += 1;

        let Some(target) = targets.get(target_idx) else {
            break;
        };
        if line_number < target.start_line {
            continue;
        }

        if out.is_none() {
            let path = output_path(log, target);
            let f = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            tracing::info!(path = %path.display(), thread = %target.name, "dumping activity");
            out = Some(BufWriter::new(f));
            written.push(path);
        }
        if let Some(w) = out.as_mut() {
            writeln!(w, "{line}")?;
        }

        if line_number >= target.end_line {
            if let Some(mut w) = out.take() {
                w.flush()?;
            }
            target_idx += 1;
        }
    }

    Ok(written)
}
