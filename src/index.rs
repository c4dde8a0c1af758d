//! Persistent scan index.
//!
//! Scanning a multi-gigabyte instrumentation log dominates a run, so the
//! parsed model is serialized beside the source as `<log>.idx` and reused as
//! long as its mtime is newer than the log's. Purely an optimization: with
//! the index on or off the produced report is identical. Invalidation is
//! mtime-only, with no content hashing.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::Model;

/// `<log>.idx`, beside the source file.
pub fn index_path(log: &Path) -> PathBuf {
    let mut name = log.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".idx");
    log.with_file_name(name)
}

/// Load the cached model, if the index artifact exists and is strictly newer
/// than the log. Any failure (missing, stale, unreadable, undecodable)
/// means a full rescan, never an aborted run.
pub fn load(log: &Path) -> Option<Model> {
    let idx = index_path(log);
    let log_mtime = std::fs::metadata(log).and_then(|m| m.modified()).ok()?;
    let idx_mtime = std::fs::metadata(&idx).and_then(|m| m.modified()).ok()?;
    if idx_mtime <= log_mtime {
        tracing::debug!(index = %idx.display(), "index is older than the log, rescanning");
        return None;
    }

    let file = File::open(&idx).ok()?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::warn!(error = %e, index = %idx.display(), "unreadable index, rescanning");
            None
        }
    }
}

/// Store a freshly scanned model. Runs unconditionally after every scan.
pub fn store(log: &Path, model: &Model) -> Result<()> {
    let idx = index_path(log);
    let file =
        File::create(&idx).with_context(|| format!("failed to create {}", idx.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, model)
        .with_context(|| format!("failed to serialize index {}", idx.display()))?;
    writer.flush()?;
    Ok(())
}
