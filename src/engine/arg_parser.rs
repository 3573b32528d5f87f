use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bounded fan-out/fan-in pipelines: copy a directory tree or download a page's images.
#[derive(Clone, Debug, Parser)]
#[command(name = "fanpipe", version)]
#[command(about = "Copy a directory tree or scrape a page's images with a bounded worker pool.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Recursively copy SRC into the existing directory DEST.
    Copy(CopyArgs),
    /// Fetch a page and download every image it references.
    Scrape(ScrapeArgs),
}

/// Flags shared by every subcommand.
#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Number of concurrent workers (>= 1). Default: 4.
    #[arg(long, short = 'w', global = true, value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Verbose output: debug logging and a progress bar.
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Append log lines to this file instead of stderr (plain format).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Timestamps in UTC instead of local time.
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub utc: Option<bool>,

    /// Plain `timestamp [LEVEL] message` lines even on a terminal.
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub plain: Option<bool>,

    /// Config file. Default: `.fanpipe.toml` in the current directory, if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct CopyArgs {
    /// Source directory.
    #[arg(long, short = 's')]
    pub src: Option<PathBuf>,

    /// Destination directory. Must already exist.
    #[arg(long, short = 'd')]
    pub dest: Option<PathBuf>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Walk the source tree in parallel (jwalk).
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub parallel_walk: Option<bool>,

    /// Strict mode: abort enumeration on the first unreadable entry instead of skipping it.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,
}

#[derive(Clone, Debug, Args)]
pub struct ScrapeArgs {
    /// Page to scan for `<img src>` links.
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Directory to save images into (created if missing). Default: ./images
    #[arg(long, short = 'd')]
    pub dest: Option<PathBuf>,

    /// Per-request timeout in seconds. Default: 30.
    #[arg(long, short = 't', value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Extra attempts per image after a network error or 5xx answer. Default: 0.
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u32))]
    pub retries: Option<u32>,
}
