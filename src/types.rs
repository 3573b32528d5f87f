//! Public and internal types for the fanpipe API and pipeline.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{PipelineError, ProcessingError};
use crate::pipeline::PipelineState;
use crate::utils::config::{DEFAULT_WORKERS, ScrapeDefaults};

/// One unit of work. Created by the producer, consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkItem {
    Path(PathBuf),
    Url(Url),
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Path(p) => write!(f, "{}", p.display()),
            WorkItem::Url(u) => write!(f, "{}", u),
        }
    }
}

impl From<PathBuf> for WorkItem {
    fn from(p: PathBuf) -> Self {
        WorkItem::Path(p)
    }
}

impl From<Url> for WorkItem {
    fn from(u: Url) -> Self {
        WorkItem::Url(u)
    }
}

/// Result of processing one [`WorkItem`]. `error` is `None` on success.
#[derive(Debug)]
pub struct Outcome {
    pub item: WorkItem,
    /// Where the item ended up (destination path), when the processor reports one.
    pub location: Option<String>,
    pub error: Option<ProcessingError>,
}

impl Outcome {
    pub fn success(item: WorkItem, location: Option<String>) -> Self {
        Outcome {
            item,
            location,
            error: None,
        }
    }

    pub fn failure(item: WorkItem, error: ProcessingError) -> Self {
        Outcome {
            item,
            location: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// How the collector knows it has seen every outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultsMode {
    /// Item count unknown (live walk): drain until every worker has exited and the channel closes.
    Streaming,
    /// Item count known up front: results channel is pre-sized and the collector counts to `n`.
    Counted(usize),
}

/// Pool sizing and channel shape for one run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of concurrent workers. Must be >= 1.
    pub workers: usize,
    /// Capacity of the item channel. 0 makes every send a hand-off to a ready worker.
    pub item_channel_cap: usize,
    pub results: ResultsMode,
    /// Drive a progress bar from the collector.
    pub progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            item_channel_cap: 0,
            results: ResultsMode::Streaming,
            progress: false,
        }
    }
}

impl PipelineConfig {
    /// Streaming config with `workers` workers. Fails when `workers` is 0.
    pub fn new(workers: usize) -> Result<Self, PipelineError> {
        let config = Self {
            workers,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn counted(mut self, n: usize) -> Self {
        self.results = ResultsMode::Counted(n);
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidWorkers(self.workers));
        }
        Ok(())
    }
}

/// Final tally of a run, returned by the collector.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Items the producer emitted.
    pub produced: usize,
    /// Outcomes the collector received.
    pub received: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failed outcomes whose error was a cancellation (also counted in `failed`).
    pub cancelled: usize,
    /// Entries the producer logged and skipped without emitting.
    pub skipped: usize,
    /// Produced items whose outcome never reached the collector (counted run stopped short).
    pub lost: usize,
    /// Set when enumeration aborted before the source was exhausted.
    pub enumeration_error: Option<String>,
    /// The run's cancel token was tripped, even if nothing was in flight.
    pub interrupted: bool,
    pub state: PipelineState,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
            && self.lost == 0
            && !self.interrupted
            && self.enumeration_error.is_none()
    }

    /// 0 only if every produced item succeeded and the run was not interrupted, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() { 0 } else { 1 }
    }
}

/// Options for the directory copier.
#[derive(Clone, Debug, Default)]
pub struct CopyOpts {
    pub src: PathBuf,
    pub dest: PathBuf,
    /// Worker count override. When None, [`DEFAULT_WORKERS`].
    pub workers: Option<usize>,
    /// Exclude patterns (glob syntax, e.g. `node_modules`, `*.log`).
    pub exclude: Vec<String>,
    pub follow_links: bool,
    /// Walk with jwalk instead of walkdir. Emission order is then whatever jwalk yields.
    pub parallel_walk: bool,
    /// Abort enumeration on the first unreadable entry instead of skipping it.
    pub strict: bool,
    /// Show a progress counter.
    pub verbose: bool,
}

/// Options for the image scraper.
#[derive(Clone, Debug)]
pub struct ScrapeOpts {
    pub page_url: String,
    pub dest: PathBuf,
    pub workers: Option<usize>,
    /// Per-request timeout (page fetch and each image).
    pub timeout: Duration,
    /// Extra attempts per image after a transient failure.
    pub retries: u32,
    pub verbose: bool,
}

impl Default for ScrapeOpts {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            dest: PathBuf::from(ScrapeDefaults::DEST_DIR),
            workers: None,
            timeout: Duration::from_secs(ScrapeDefaults::TIMEOUT_SECS),
            retries: 0,
            verbose: false,
        }
    }
}
