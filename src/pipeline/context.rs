//! Pipeline context: channels and the small amount of shared state handed to the producer and workers.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::types::{Outcome, PipelineConfig, ResultsMode, WorkItem};

use super::cancel::CancelToken;
use super::state::StateCell;

/// (item label, reason) for an entry the producer skipped.
pub type SkippedEntry = (String, String);

/// Shared context for the producer thread. Everything in here is either immutable or
/// only written by the producer; workers never touch it.
#[derive(Clone)]
pub struct PipelineContext {
    pub cancel: CancelToken,
    pub state: StateCell,
    pub enumeration_error: Arc<Mutex<Option<String>>>,
    pub skipped: Arc<Mutex<Vec<SkippedEntry>>>,
}

impl PipelineContext {
    pub fn new(cancel: &CancelToken) -> Self {
        Self {
            cancel: cancel.clone(),
            state: StateCell::default(),
            enumeration_error: Arc::new(Mutex::new(None)),
            skipped: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): the collector drains `outcome_rx`,
/// then joins `producer_handle` and `worker_handles`.
pub struct PipelineHandles {
    pub outcome_rx: Receiver<Outcome>,
    pub producer_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub config: PipelineConfig,
    pub ctx: PipelineContext,
}

/// Item and outcome channels. Producer gets `item_tx`; workers get `item_rx` and `outcome_tx`.
pub struct PipelineChannels {
    pub item_tx: Sender<WorkItem>,
    pub item_rx: Receiver<WorkItem>,
    pub outcome_tx: Sender<Outcome>,
    pub outcome_rx: Receiver<Outcome>,
}

/// Item channel uses `config.item_channel_cap` (0 = hand-off). The outcome channel holds one slot
/// per worker when streaming, or exactly `n` slots when the item count is known, so workers never
/// block on a counted run.
pub fn create_pipeline_channels(config: &PipelineConfig) -> PipelineChannels {
    let (item_tx, item_rx) = bounded::<WorkItem>(config.item_channel_cap);
    let outcome_cap = match config.results {
        ResultsMode::Streaming => config.workers,
        ResultsMode::Counted(n) => n,
    };
    let (outcome_tx, outcome_rx) = bounded::<Outcome>(outcome_cap);
    PipelineChannels {
        item_tx,
        item_rx,
        outcome_tx,
        outcome_rx,
    }
}
