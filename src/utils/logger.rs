//! Logging setup. The binary builds a [`LogConfig`] and hands it to [`init_logging`]; library code
//! only uses the `log` macros.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use colored::Colorize;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Where log lines go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    /// Append to this file (created if missing).
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogTimeZone {
    #[default]
    Local,
    Utc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// `[fanpipe WARN target] msg`, colored. Terminal use.
    #[default]
    Colored,
    /// `2026-10-16 3:04PM (UTC) [WARN] msg`. Log files.
    Plain,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub sink: LogSink,
    /// Level for this crate; dependencies stay at WARN.
    pub min_level: LevelFilter,
    pub time_zone: LogTimeZone,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sink: LogSink::Stderr,
            min_level: LevelFilter::Info,
            time_zone: LogTimeZone::Local,
            format: LogFormat::Colored,
        }
    }
}

impl LogConfig {
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.min_level = LevelFilter::Debug;
        }
        self
    }
}

/// Install the global logger described by `config`. Fails if the log file can't be opened or a
/// logger is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), config.min_level);

    match &config.sink {
        LogSink::Stderr => {
            builder.target(Target::Stderr);
        }
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
    }

    let format = config.format;
    let time_zone = config.time_zone;
    builder.format(move |buf, record| {
        let stamp = timestamp(time_zone);
        let line = format_line(
            format,
            &stamp,
            record.level(),
            record.target(),
            &record.args().to_string(),
        );
        writeln!(buf, "{}", line)
    });
    builder.try_init().context("install logger")?;
    Ok(())
}

fn timestamp(time_zone: LogTimeZone) -> String {
    match time_zone {
        LogTimeZone::Local => Local::now().format("%Y-%m-%d %-I:%M%p (%:z)").to_string(),
        LogTimeZone::Utc => Utc::now().format("%Y-%m-%d %-I:%M%p (UTC)").to_string(),
    }
}

/// Render one log line (no trailing newline).
pub fn format_line(format: LogFormat, stamp: &str, level: Level, target: &str, msg: &str) -> String {
    let name = env!("CARGO_PKG_NAME");
    match format {
        LogFormat::Plain => format!("{} [{}] {}", stamp, level, msg),
        LogFormat::Colored => match level {
            Level::Error | Level::Warn => {
                let level_str = match level {
                    Level::Warn => "WARN".yellow(),
                    _ => "ERROR".red(),
                };
                format!("[{} {} {}] {}", name.cyan(), level_str, target.white(), msg)
            }
            _ => format!("[{}] {}", name.cyan(), msg),
        },
    }
}
