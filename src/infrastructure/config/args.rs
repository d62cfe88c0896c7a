use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "rwitt",
    version,
    about = "A lightweight desktop timeline client",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Image cache directory.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Post store file path.
    #[arg(long, value_name = "PATH")]
    pub store_path: Option<PathBuf>,

    /// Number of download workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// How many stored posts to load at startup.
    #[arg(long)]
    pub preload: Option<usize>,
}
