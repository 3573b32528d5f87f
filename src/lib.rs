//! fanpipe: a bounded fan-out/fan-in work pipeline.
//!
//! A producer streams [`WorkItem`]s, a fixed pool of workers runs an [`ItemProcessor`] on each
//! one, and a collector receives exactly one [`Outcome`] per item. Two ready-made runs sit on top:
//! [`copy_tree`] (directory copy) and [`scrape_images`] (download every image on a page).

pub mod copy;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod scrape;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use copy::{copy_tree, copy_tree_with};
pub use error::{PipelineError, ProcessingError};
pub use pipeline::{
    CancelToken, ItemProcessor, PipelineState, SourceEvent, drain_outcomes, execute, run_pipeline,
};
pub use scrape::{download_all, scrape_images, scrape_images_with};

/// Result alias used by public fanpipe API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Run `processor` over a fixed list of items with `workers` workers, counting outcomes to the
/// list's length. Returns the summary and every outcome in arrival order.
///
/// ```ignore
/// let items = paths.into_iter().map(fanpipe::WorkItem::Path);
/// let (summary, outcomes) = fanpipe::process_items(items, 8, my_processor, &CancelToken::new())?;
/// ```
pub fn process_items<I, P>(
    items: I,
    workers: usize,
    processor: P,
    cancel: &CancelToken,
) -> Result<(RunSummary, Vec<Outcome>)>
where
    I: IntoIterator<Item = WorkItem>,
    P: ItemProcessor + 'static,
{
    let source: Vec<SourceEvent> = items.into_iter().map(SourceEvent::Item).collect();
    let config = PipelineConfig::new(workers)?.counted(source.len());
    let mut outcomes = Vec::with_capacity(source.len());
    let summary = execute(source, processor, &config, cancel, |o| outcomes.push(o))?;
    Ok((summary, outcomes))
}
