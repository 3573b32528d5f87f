use anyhow::Result;
use log::debug;
use std::sync::Arc;

use crate::types::{Outcome, PipelineConfig, RunSummary};

use super::cancel::CancelToken;
use super::collector::drain_outcomes;
use super::context::{PipelineContext, PipelineHandles, create_pipeline_channels};
use super::producer::{SourceEvent, spawn_producer};
use super::state::PipelineState;
use super::workers::{ItemProcessor, spawn_workers};

/// Start producer + worker pool. Returns handles; the caller drains `outcome_rx`
/// (see [`drain_outcomes`]) and joins the threads.
///
/// The config is validated before any thread starts.
pub fn run_pipeline<S, P>(
    source: S,
    processor: P,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<PipelineHandles>
where
    S: IntoIterator<Item = SourceEvent> + Send + 'static,
    P: ItemProcessor + 'static,
{
    config.validate()?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        config
    );

    let channels = create_pipeline_channels(config);
    let ctx = PipelineContext::new(cancel);
    ctx.state.advance(PipelineState::Enumerating);

    let worker_handles = spawn_workers(
        config.workers,
        channels.item_rx,
        &channels.outcome_tx,
        Arc::new(processor),
        cancel,
    );
    let producer_handle = spawn_producer(source, channels.item_tx, ctx.clone());

    // Workers now hold the only senders; the channel closes when the last one exits.
    drop(channels.outcome_tx);

    Ok(PipelineHandles {
        outcome_rx: channels.outcome_rx,
        producer_handle,
        worker_handles,
        config: config.clone(),
        ctx,
    })
}

/// Run the whole pipeline to completion: start, drain, join.
pub fn execute<S, P, F>(
    source: S,
    processor: P,
    config: &PipelineConfig,
    cancel: &CancelToken,
    on_outcome: F,
) -> Result<RunSummary>
where
    S: IntoIterator<Item = SourceEvent> + Send + 'static,
    P: ItemProcessor + 'static,
    F: FnMut(Outcome),
{
    let handles = run_pipeline(source, processor, config, cancel)?;
    drain_outcomes(handles, on_outcome)
}
