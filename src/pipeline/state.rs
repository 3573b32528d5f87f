//! Run state: `Idle -> Enumerating -> Draining -> Done`, forward-only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    #[default]
    Idle,
    /// Producer and workers launched; producer still emitting.
    Enumerating,
    /// Item channel closed; workers finish what is buffered.
    Draining,
    /// All workers exited and every outcome was received.
    Done,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => PipelineState::Idle,
            1 => PipelineState::Enumerating,
            2 => PipelineState::Draining,
            _ => PipelineState::Done,
        }
    }
}

/// Shared state cell. `advance` never moves backwards, so racing writers can't regress it.
#[derive(Clone, Debug, Default)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` if it is ahead of the current state. Returns the state now in effect.
    pub fn advance(&self, to: PipelineState) -> PipelineState {
        let prev = self.0.fetch_max(to as u8, Ordering::AcqRel);
        let now = PipelineState::from_u8(prev).max(to);
        if now != PipelineState::from_u8(prev) {
            log::debug!("pipeline state: {:?} -> {:?}", PipelineState::from_u8(prev), now);
        }
        now
    }
}
