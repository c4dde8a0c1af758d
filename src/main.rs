mod dump;
mod index;
mod lines;
mod model;
mod report;
mod scanner;
mod stats;
mod timestamp;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use model::{Model, Thread};
use scanner::Scanner;

#[derive(Parser)]
#[command(
    name = "instlog",
    version,
    about = "Instrumentation log report tool for business-process engine traces"
)]
struct Cli {
    /// Instrumentation log file (txt format)
    #[arg(short, long)]
    file: PathBuf,

    /// Number of expensive activities to print
    #[arg(short, long, default_value_t = 10)]
    top: usize,

    /// Print a detailed profile for each expensive activity
    #[arg(short, long)]
    prof: bool,

    /// Maximum depth level for detailed profiles
    #[arg(short, long)]
    level: Option<u32>,

    /// Print top self periods for each expensive activity
    #[arg(short = 's', long = "self")]
    top_self: bool,

    /// Dump each expensive activity's raw log to a separate file
    #[arg(short, long)]
    dump: bool,

    /// Ignore the cached index and forcibly rescan the log file
    #[arg(short, long)]
    rescan: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("instlog=info".parse()?),
        )
        .init();

    if !cli.file.exists() {
        bail!("instrumentation log not found: {}", cli.file.display());
    }

    let model = load_or_scan(&cli.file, cli.rescan)?;

    let wc = stats::top_threads(&model, "WebContainer", cli.top);
    let tp = stats::top_threads(&model, "ThreadPool worker", cli.top);
    let sections = [
        ("WebContainer", wc.as_slice()),
        ("ThreadPool worker", tp.as_slice()),
    ];

    let opts = report::ReportOptions {
        top_count: cli.top,
        max_depth: cli.level,
        show_profile: cli.prof,
        show_self_periods: cli.top_self,
    };

    let report_path = report::report_path(&cli.file);
    let out = File::create(&report_path)
        .with_context(|| format!("failed to create {}", report_path.display()))?;
    let mut out = BufWriter::new(out);
    report::write_report(&mut out, &model, &sections, &opts)?;
    out.flush()?;
    eprintln!("Report saved to {}", report_path.display());

    if cli.dump {
        let selected: Vec<&Thread> = wc.iter().chain(tp.iter()).copied().collect();
        let written = dump::dump_threads(&cli.file, &selected)?;
        eprintln!("Dumped {} activity logs beside the source", written.len());
    }

    Ok(())
}

/// Reuse the on-disk index when allowed and fresh; otherwise scan and
/// reindex. Either way the caller gets the same model.
fn load_or_scan(path: &Path, rescan: bool) -> Result<Model> {
    if !rescan {
        if let Some(model) = index::load(path) {
            eprintln!("Loaded cached index {}", index::index_path(path).display());
            return Ok(model);
        }
    }

    eprintln!("Scanning {}", path.display());
    let start = Instant::now();
    let model = Scanner::scan_file(path)?;
    tracing::info!(
        threads = model.threads.len(),
        seconds = start.elapsed().as_secs_f64(),
        "scan complete"
    );

    // The index is an optimization; failing to write it is not fatal.
    if let Err(e) = index::store(path, &model) {
        tracing::warn!(error = %e, "failed to write index");
    }
    Ok(model)
}
