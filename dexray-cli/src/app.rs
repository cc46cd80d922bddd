use std::path::PathBuf;

use clap::Parser;

/// dexray - recover original files and metadata from antivirus quarantine containers
#[derive(Debug, Parser)]
#[command(name = "dexray", version, about, long_about = None)]
pub struct Cli {
    /// Path to the quarantine container.
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Vendor believed to have produced the file (ahnlab, avast, mcafee, defender, trendmicro).
    #[arg(long, value_name = "VENDOR")]
    pub hint: Option<String>,

    /// Ignore the hint and try every decoder in the fixed order.
    #[arg(long, conflicts_with = "hint")]
    pub no_hint: bool,

    /// Directory for recovered files. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Refuse the result and remove recovered files if more than this many were found.
    #[arg(long, value_name = "COUNT", default_value_t = 1000)]
    pub max_extracted: usize,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options controlling how results are presented.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}
