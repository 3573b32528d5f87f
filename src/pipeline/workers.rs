//! Worker pool: fixed number of threads turning items into outcomes.

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::ProcessingError;
use crate::types::{Outcome, WorkItem};

use super::cancel::CancelToken;

/// Per-item operation run by the workers (copy, download, transform...).
///
/// Returns the item's location on success. Retries, if any, belong in here.
pub trait ItemProcessor: Send + Sync {
    fn process(
        &self,
        item: &WorkItem,
        cancel: &CancelToken,
    ) -> Result<Option<String>, ProcessingError>;
}

impl<F> ItemProcessor for F
where
    F: Fn(&WorkItem, &CancelToken) -> Result<Option<String>, ProcessingError> + Send + Sync,
{
    fn process(
        &self,
        item: &WorkItem,
        cancel: &CancelToken,
    ) -> Result<Option<String>, ProcessingError> {
        self(item, cancel)
    }
}

/// Spawn `num_workers` workers. Caller must drop its own `outcome_tx` afterwards so the outcome
/// channel closes once the last worker exits.
pub fn spawn_workers<P>(
    num_workers: usize,
    item_rx: Receiver<WorkItem>,
    outcome_tx: &Sender<Outcome>,
    processor: Arc<P>,
    cancel: &CancelToken,
) -> Vec<JoinHandle<()>>
where
    P: ItemProcessor + ?Sized + 'static,
{
    (0..num_workers)
        .map(|worker_id| {
            let item_rx = item_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let processor = Arc::clone(&processor);
            let cancel = cancel.clone();
            thread::spawn(move || {
                worker_loop(worker_id, item_rx, outcome_tx, processor.as_ref(), &cancel)
            })
        })
        .collect()
}

/// Receive until the item channel is closed and empty; send exactly one outcome per item.
fn worker_loop<P>(
    worker_id: usize,
    item_rx: Receiver<WorkItem>,
    outcome_tx: Sender<Outcome>,
    processor: &P,
    cancel: &CancelToken,
) where
    P: ItemProcessor + ?Sized,
{
    let mut handled = 0_usize;
    while let Ok(item) = item_rx.recv() {
        let outcome = process_one(processor, item, cancel);
        handled += 1;
        if let Err(e) = outcome_tx.send(outcome) {
            warn!(
                "worker {}: collector stopped listening, dropping outcome for {}",
                worker_id,
                e.into_inner().item
            );
            break;
        }
    }
    debug!("worker {}: exiting after {} items", worker_id, handled);
    drop(outcome_tx);
}

/// Run the processor on one item. Cancellation and panics become failed outcomes.
pub fn process_one<P>(processor: &P, item: WorkItem, cancel: &CancelToken) -> Outcome
where
    P: ItemProcessor + ?Sized,
{
    if cancel.is_cancelled() {
        return Outcome::failure(item, ProcessingError::Cancelled);
    }
    match catch_unwind(AssertUnwindSafe(|| processor.process(&item, cancel))) {
        Ok(Ok(location)) => Outcome::success(item, location),
        Ok(Err(e)) => Outcome::failure(item, e),
        Err(payload) => Outcome::failure(item, ProcessingError::Panicked(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
