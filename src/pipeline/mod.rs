//! Pipeline components: producer, worker pool, collector, and the glue between them.
//!
//! Data flows one way: producer → item channel → workers → outcome channel → collector.

pub mod cancel;
pub mod collector;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod producer;
pub mod state;
pub mod workers;

pub use cancel::CancelToken;
pub use collector::drain_outcomes;
pub use context::{
    PipelineChannels, PipelineContext, PipelineHandles, SkippedEntry, create_pipeline_channels,
};
pub use error_handler::report_enumeration_issues;
pub use orchestrator::{execute, run_pipeline};
pub use producer::{SourceEvent, run_producer_loop, spawn_producer};
pub use state::{PipelineState, StateCell};
pub use workers::{ItemProcessor, process_one, spawn_workers};
