use clap::Parser;
use std::path::PathBuf;

use crate::ErrorPolicy;

/// Concurrent, recursive archive sampler: write the first lines of every file to `.schema` files.
#[derive(Clone, Parser)]
#[command(name = "schemadump")]
#[command(about = "Sample the first lines of every file inside the data directory, archives included.")]
pub struct Cli {
    /// Directory whose immediate children are sampled. Default: ./data/
    #[arg(value_name = "DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Output directory for .schema files (created if absent). Default: ./schema/
    #[arg(long, short = 's')]
    pub schema_path: Option<PathBuf>,

    /// Top-level files processed concurrently.
    #[arg(long, short = 'p', value_parser = clap::value_parser!(usize))]
    pub process_count: Option<usize>,

    /// Entries processed concurrently per archive level.
    #[arg(long, short = 't', value_parser = clap::value_parser!(usize))]
    pub thread_pool_count: Option<usize>,

    /// Lines kept per sampled file.
    #[arg(long, short = 'l', value_parser = clap::value_parser!(usize))]
    pub lines: Option<usize>,

    /// What to do when a file or entry fails.
    #[arg(long, short = 'e', value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// Exclude top-level names (glob syntax). Can specify multiple: -x pattern1 pattern2
    #[arg(long, short = 'x', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Maximum nested-archive depth.
    #[arg(long, short = 'd', value_parser = clap::value_parser!(usize))]
    pub max_depth: Option<usize>,

    /// Show a progress bar over top-level files.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Settings file. Default: .schemadump.toml in the working directory.
    #[arg(long)]
    pub config: Option<PathBuf>,
}
