use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::time::Instant;

use chansweep::analyze;
use chansweep::channels::{self, ChannelFilter};
use chansweep::cli::Args;
use chansweep::report;
use chansweep::sequence::Sequence;
use chansweep::stats::ExrStats;

fn main() -> Result<()> {
    let args = Args::parse();

    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let default_level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    debug!("Command-line args: {:?}", args);

    let start = Instant::now();
    let step = args.step.max(1);

    let seq = Sequence::scan(&args.target, &args.ext)
        .with_context(|| format!("Failed to scan sequence: {}", args.target.display()))?;
    info!("Analyzing sequence in {}", seq.dir().display());

    let filter = match &args.exclude {
        Some(prefixes) => ChannelFilter::new(prefixes.clone()),
        None => ChannelFilter::default_excluded(),
    };

    let first = seq.first();
    let layers = channels::discover(&first.path, &filter)
        .with_context(|| format!("Failed to read channels from {}", first.path.display()))?;
    info!("Layers: {:?}", layers);

    let mut stats = ExrStats::new();
    let analysis = analyze::analyze(&seq, &layers, step, &mut stats)?;
    let elapsed = start.elapsed();

    report::print_summary(&analysis, elapsed);

    if let Some(report_arg) = &args.report {
        let path = report_arg
            .clone()
            .unwrap_or_else(|| seq.dir().join(report::DEFAULT_REPORT_NAME));
        report::write_text(&path, &analysis, seq.dir(), step, elapsed)?;
        println!("Log file saved: {}", path.display());
    }

    if let Some(json_path) = &args.json {
        report::write_json(json_path, &analysis)?;
    }

    Ok(())
}
