//! Error taxonomy for pipeline runs: setup/enumeration failures and per-item processing failures.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a pipeline run (or keep it from starting).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad setup, e.g. destination root missing. Raised before any thread starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Worker count below the lower bound.
    #[error("worker count must be at least 1 (got {0})")]
    InvalidWorkers(usize),

    /// The whole source could not be enumerated.
    #[error("enumeration failed: {0}")]
    Enumeration(String),

    /// A pipeline thread died outside of item processing.
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Failure while processing a single item. Always captured into that item's [`Outcome`](crate::Outcome).
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cancelled before completion")]
    Cancelled,

    #[error("processor panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

impl ProcessingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessingError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessingError::Cancelled)
    }

    /// Transport failures and 5xx answers are worth another attempt; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            ProcessingError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            ProcessingError::Body { .. } => true,
            ProcessingError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
