use clap::Parser;
use std::path::PathBuf;

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"),
    "\n",
    "EXR:    exrs (pure Rust)\n",
    "Target: ",
    std::env::consts::ARCH,
    "-",
    std::env::consts::OS
);

/// Empty-channel detector for EXR render sequences
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Sequence directory, glob pattern (render.*.exr) or single frame file
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Sample every Nth file of the sequence
    #[arg(short = 's', long = "step", value_name = "N", default_value_t = 10)]
    pub step: usize,

    /// Sequence file extension
    #[arg(short = 'e', long = "ext", value_name = "EXT", default_value = "exr")]
    pub ext: String,

    /// Layer prefixes excluded from analysis (default: N, albedo, normal)
    #[arg(short = 'x', long = "exclude", value_name = "LAYER")]
    pub exclude: Option<Vec<String>>,

    /// Write the plain-text report (default: empty_channels.log next to the sequence)
    #[arg(short = 'r', long = "report", value_name = "FILE")]
    pub report: Option<Option<PathBuf>>,

    /// Write the analysis as pretty-printed JSON
    #[arg(short = 'j', long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
