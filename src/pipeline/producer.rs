//! Producer: consumes a source of [`SourceEvent`]s and feeds items to the workers.

use crossbeam_channel::{SendTimeoutError, Sender};
use log::{debug, error, warn};
use std::thread::{self, JoinHandle};

use crate::types::WorkItem;
use crate::utils::config::CANCEL_POLL_INTERVAL;

use super::cancel::CancelToken;
use super::context::PipelineContext;
use super::state::PipelineState;

/// One event from an enumeration source.
#[derive(Debug)]
pub enum SourceEvent {
    /// An item to process.
    Item(WorkItem),
    /// A per-entry problem: logged, recorded, enumeration continues.
    Skipped { msg: String, item: Option<String> },
    /// The whole source failed: enumeration stops; items already sent are still processed.
    Fatal(String),
}

/// Spawn the producer thread. The source is turned into an iterator on that thread, so only the
/// source description needs to be `Send`.
pub fn spawn_producer<S>(
    source: S,
    item_tx: Sender<WorkItem>,
    ctx: PipelineContext,
) -> JoinHandle<usize>
where
    S: IntoIterator<Item = SourceEvent> + Send + 'static,
{
    thread::spawn(move || run_producer_loop(item_tx, &ctx, source))
}

/// Emit every item from `events` on `item_tx`; stop early on `Fatal`, cancellation, or when no
/// worker is left to receive. Drops `item_tx` exactly once on the way out (the only close signal
/// workers see) and moves the run to `Draining`. Returns the number of items handed to workers.
pub fn run_producer_loop<I>(item_tx: Sender<WorkItem>, ctx: &PipelineContext, events: I) -> usize
where
    I: IntoIterator<Item = SourceEvent>,
{
    let mut count = 0_usize;
    for event in events {
        if ctx.cancel.is_cancelled() {
            debug!("producer: cancelled after {} items", count);
            break;
        }
        match event {
            SourceEvent::Item(item) => {
                if !send_item(&item_tx, item, &ctx.cancel) {
                    break;
                }
                count += 1;
            }
            SourceEvent::Skipped { msg, item } => {
                let label = item.unwrap_or_else(|| "<unknown>".to_string());
                warn!("Skipping {}: {}", label, msg);
                if let Ok(mut skipped) = ctx.skipped.lock() {
                    skipped.push((label, msg));
                }
            }
            SourceEvent::Fatal(msg) => {
                error!("Enumeration aborted: {}", msg);
                if let Ok(mut first) = ctx.enumeration_error.lock() {
                    first.get_or_insert(msg);
                }
                break;
            }
        }
    }
    drop(item_tx);
    ctx.state.advance(PipelineState::Draining);
    debug!("producer: done, {} items emitted", count);
    count
}

/// Blocking send that wakes up to check `cancel`. False when the item was not delivered.
fn send_item(item_tx: &Sender<WorkItem>, mut item: WorkItem, cancel: &CancelToken) -> bool {
    loop {
        match item_tx.send_timeout(item, CANCEL_POLL_INTERVAL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if cancel.is_cancelled() {
                    debug!("producer: dropping {} on cancel", back);
                    return false;
                }
                item = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
