//! Application configuration constants.
//! Defaults and limits in one place.

use std::sync::OnceLock;
use std::time::Duration;

use log::{debug, warn};

use crate::error::PipelineError;
use crate::utils::fd_limit::max_workers_by_fd_limit;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Config file looked up in the current directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Worker pool ----

/// Workers used when the caller does not pick a count.
pub const DEFAULT_WORKERS: usize = 4;

/// How often a blocked producer send wakes up to look at the cancel token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolve the worker count: default when unset, reject 0, cap at what the FD limit allows.
pub fn resolve_workers(requested: Option<usize>) -> Result<usize, PipelineError> {
    let workers = requested.unwrap_or(DEFAULT_WORKERS);
    if workers == 0 {
        return Err(PipelineError::InvalidWorkers(workers));
    }
    match max_workers_by_fd_limit() {
        Some(fd_cap) if fd_cap < workers => {
            warn!("Capping workers {} -> {} (FD limit ~80%)", workers, fd_cap);
            Ok(fd_cap)
        }
        _ => {
            debug!("Using {} workers", workers);
            Ok(workers)
        }
    }
}

/// Chunk size for cancel-aware file copies and body downloads (bytes). 64 KB.
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

// ---- Scraper ----

pub struct ScrapeDefaults;

impl ScrapeDefaults {
    pub const DEST_DIR: &'static str = "./images";
    pub const TIMEOUT_SECS: u64 = 30;
    /// Pause between retry attempts; multiplied by the attempt number.
    pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);
}

/// File extensions (lowercase, with dot) that mark an `img src` as an image worth downloading.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".ai", ".apng", ".arw", ".avif", ".bmp", ".cr2", ".cr3", ".crw", ".cur", ".dcr", ".dds", ".dib",
    ".dng", ".eps", ".erf", ".exr", ".fff", ".gif", ".hdp", ".hdr", ".heic", ".heif", ".ico",
    ".iiq", ".j2k", ".jng", ".jp2", ".jpeg", ".jpf", ".jpg", ".jpm", ".jpx", ".jxr", ".kdc",
    ".mef", ".mj2", ".mos", ".mrw", ".nef", ".nrw", ".orf", ".pcx", ".pjp", ".pjpeg", ".png",
    ".psd", ".ptx", ".pxn", ".r3d", ".raf", ".raw", ".rw2", ".rwl", ".rwz", ".sr2", ".srf",
    ".srw", ".svg", ".svgz", ".tga", ".tif", ".tiff", ".wbmp", ".wdp", ".webp", ".x3f", ".xbm",
];
