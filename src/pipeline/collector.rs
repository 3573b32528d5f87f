//! Collector: drains the outcome channel, logs each outcome, and tallies the run.

use anyhow::Result;
use crossbeam_channel::Receiver;
use kdam::Animation;
use log::{debug, error, info, warn};

use crate::engine::progress::{
    ProgressBar, ProgressBarConfig, create_counter, create_progress_bar, refresh_bar,
    update_progress_bar,
};
use crate::error::PipelineError;
use crate::types::{Outcome, ResultsMode, RunSummary};

use super::context::PipelineHandles;
use super::error_handler::report_enumeration_issues;
use super::state::PipelineState;

/// Receive every outcome, then join the producer and workers.
///
/// - **Streaming**: read until the channel disconnects. That only happens once every worker has
///   dropped its sender, i.e. after all workers exited their receive loop.
/// - **Counted(n)**: read exactly `n` outcomes. An early disconnect ends the loop instead of hanging.
///
/// `on_outcome` takes ownership of each outcome after it is logged. Item failures never fail the
/// run; the returned [`RunSummary`] carries the counts.
pub fn drain_outcomes<F>(handles: PipelineHandles, mut on_outcome: F) -> Result<RunSummary>
where
    F: FnMut(Outcome),
{
    let PipelineHandles {
        outcome_rx,
        producer_handle,
        worker_handles,
        config,
        ctx,
    } = handles;

    let bar = config.progress.then(|| progress_for(config.results));
    let mut summary = RunSummary::default();
    let mut record = |outcome: Outcome| {
        log_outcome(&outcome);
        summary.received += 1;
        match &outcome.error {
            None => summary.succeeded += 1,
            Some(e) => {
                summary.failed += 1;
                if e.is_cancelled() {
                    summary.cancelled += 1;
                }
            }
        }
        if let Some(bar) = &bar {
            update_progress_bar(bar, 1);
        }
        on_outcome(outcome);
    };

    match config.results {
        ResultsMode::Streaming => {
            while let Ok(outcome) = outcome_rx.recv() {
                record(outcome);
            }
        }
        ResultsMode::Counted(n) => receive_counted(&outcome_rx, n, &mut record),
    }
    // Any sender still holding an outcome now gets an error instead of blocking forever.
    drop(outcome_rx);
    if let Some(bar) = &bar {
        refresh_bar(bar);
        eprintln!();
    }

    summary.produced = producer_handle
        .join()
        .map_err(|_| PipelineError::WorkerPanicked("producer"))?;
    for h in worker_handles {
        h.join().map_err(|_| PipelineError::WorkerPanicked("worker"))?;
    }
    let (skipped, enumeration_error) = report_enumeration_issues(&ctx, config.progress);
    summary.skipped = skipped;
    summary.enumeration_error = enumeration_error;

    summary.lost = summary.produced.saturating_sub(summary.received);
    if summary.received != summary.produced {
        error!(
            "Outcome count mismatch: {} items produced, {} outcomes received",
            summary.produced, summary.received
        );
    }
    summary.interrupted = ctx.cancel.is_cancelled();
    summary.state = ctx.state.advance(PipelineState::Done);
    info!(
        "Run finished: {} processed, {} succeeded, {} failed{}{}",
        summary.received,
        summary.succeeded,
        summary.failed,
        if summary.cancelled > 0 {
            format!(" ({} cancelled)", summary.cancelled)
        } else {
            String::new()
        },
        if summary.lost > 0 {
            format!(", {} lost", summary.lost)
        } else {
            String::new()
        }
    );
    Ok(summary)
}

fn receive_counted<F>(outcome_rx: &Receiver<Outcome>, n: usize, record: &mut F)
where
    F: FnMut(Outcome),
{
    for received in 0..n {
        match outcome_rx.recv() {
            Ok(outcome) => record(outcome),
            Err(_) => {
                // Fewer items were produced than announced (enumeration aborted or cancelled).
                debug!(
                    "collector: channel closed after {} of {} expected outcomes",
                    received, n
                );
                return;
            }
        }
    }
}

fn log_outcome(outcome: &Outcome) {
    match (&outcome.error, &outcome.location) {
        (None, Some(location)) => info!("Processed {} -> {}", outcome.item, location),
        (None, None) => info!("Processed {}", outcome.item),
        (Some(e), _) if e.is_cancelled() => warn!("Cancelled {}", outcome.item),
        (Some(e), _) => error!("Failed {}: {}", outcome.item, e),
    }
}

fn progress_for(mode: ResultsMode) -> ProgressBar {
    match mode {
        ResultsMode::Counted(n) => {
            create_progress_bar(ProgressBarConfig::new(n, "Processing", Animation::Classic))
        }
        ResultsMode::Streaming => {
            let bar = create_counter("Processing");
            refresh_bar(&bar);
            bar
        }
    }
}
