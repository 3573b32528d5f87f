pub mod config;
pub mod fanpipe_toml;
pub mod fd_limit;
pub mod logger;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, max_workers_by_fd_limit};
pub use logger::{LogConfig, LogFormat, LogSink, LogTimeZone, format_line, init_logging};
