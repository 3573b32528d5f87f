//! Recursive directory copy on top of the pipeline: walk → copy workers → collector.

pub mod processor;
pub mod walk;

use anyhow::Result;
use log::{debug, info};
use std::path::PathBuf;

use crate::engine::tools::existing_dir;
use crate::error::PipelineError;
use crate::pipeline::{self, CancelToken};
use crate::types::{CopyOpts, Outcome, PipelineConfig, RunSummary};
use crate::utils::config::resolve_workers;

pub use processor::CopyProcessor;
pub use walk::{WalkSource, to_event_jwalk, to_event_walkdir};

/// Source must be a directory; destination root must already exist and must not sit inside the
/// source. Returns both canonicalized. Any failure is a configuration error: nothing is started.
pub fn check_copy_roots(opts: &CopyOpts) -> Result<(PathBuf, PathBuf), PipelineError> {
    let src = existing_dir(&opts.src, "source")?;
    let dest = existing_dir(&opts.dest, "destination")?;
    if dest.starts_with(&src) {
        return Err(PipelineError::Config(format!(
            "destination {} is inside source {}",
            dest.display(),
            src.display()
        )));
    }
    Ok((src, dest))
}

/// Copy `opts.src` into `opts.dest` with a bounded worker pool.
pub fn copy_tree(opts: &CopyOpts, cancel: &CancelToken) -> Result<RunSummary> {
    copy_tree_with(opts, cancel, |_| {})
}

/// [`copy_tree`] with a callback for every outcome.
pub fn copy_tree_with<F>(opts: &CopyOpts, cancel: &CancelToken, on_outcome: F) -> Result<RunSummary>
where
    F: FnMut(Outcome),
{
    let (src, dest) = check_copy_roots(opts)?;
    let config = PipelineConfig {
        workers: resolve_workers(opts.workers)?,
        progress: opts.verbose,
        ..PipelineConfig::default()
    };
    info!("Copying {} to {}", src.display(), dest.display());
    if opts.parallel_walk {
        debug!("Walking in parallel");
    } else {
        debug!("Walking serially");
    }

    let source = WalkSource::new(src.clone(), opts);
    let processor = CopyProcessor::new(src, dest);
    pipeline::execute(source, processor, &config, cancel, on_outcome)
}
