//! Analysis report output: console summary, plain-text log, JSON
//!
//! The text format mirrors the farm-side channel log so downstream scripts
//! keep parsing it: a header block with directory/step/elapsed, then the
//! partition, then the first-seen table.

use anyhow::{Context, Result};
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::analyze::Analysis;

/// Default file name for the text report, written next to the sequence
pub const DEFAULT_REPORT_NAME: &str = "empty_channels.log";

/// Render the plain-text report
pub fn render_text(analysis: &Analysis, dir: &Path, step: usize, elapsed: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[Empty Channels Analysis]");
    let _ = writeln!(out, "  - Directory: {}", dir.display());
    let _ = writeln!(out, "  - Frame Step: {}", step);
    let _ = writeln!(out, "  - Elapsed Time: {:.2} seconds", elapsed.as_secs_f64());
    let _ = writeln!(out);
    let _ = writeln!(out, "[Valid Channels]: {:?}", analysis.valid);
    let _ = writeln!(out);
    let _ = writeln!(out, "[Empty Channels]: {:?}", analysis.empty);
    let _ = writeln!(out);
    let _ = writeln!(out, "[Valid Channels Data]");
    for (layer, frame) in &analysis.first_seen {
        let _ = writeln!(out, "  {}: {}", layer, frame);
    }
    out
}

/// Write the plain-text report, creating parent directories as needed
pub fn write_text(
    path: &Path,
    analysis: &Analysis,
    dir: &Path,
    step: usize,
    elapsed: Duration,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }

    fs::write(path, render_text(analysis, dir, step, elapsed))
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    info!("Report saved: {}", path.display());
    Ok(())
}

/// Write the analysis as pretty-printed JSON
pub fn write_json(path: &Path, analysis: &Analysis) -> Result<()> {
    let json =
        serde_json::to_string_pretty(analysis).context("Failed to serialize analysis")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))?;

    info!("JSON report saved: {}", path.display());
    Ok(())
}

/// Console summary printed after analysis
pub fn print_summary(analysis: &Analysis, elapsed: Duration) {
    println!("\n=== Final Channel Analysis ===\n");
    println!("Valid Channels: {:?}\n", analysis.valid);
    println!("Empty Channels: {:?}", analysis.empty);
    println!("\nElapsed time: {:.2} seconds", elapsed.as_secs_f64());
}
