//! Load `.fanpipe.toml` (CLI only). Library callers build `CopyOpts`/`ScrapeOpts` themselves.

use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::types::{CopyOpts, ScrapeOpts};
use crate::utils::logger::{LogConfig, LogFormat, LogSink, LogTimeZone};

#[derive(Debug, Default, Deserialize)]
pub struct FanpipeToml {
    #[serde(default)]
    pipeline: PipelineSection,
    #[serde(default)]
    copy: CopySection,
    #[serde(default)]
    scrape: ScrapeSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineSection {
    workers: Option<usize>,
    verbose: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct CopySection {
    src: Option<PathBuf>,
    dest: Option<PathBuf>,
    exclude: Option<Vec<String>>,
    follow_links: Option<bool>,
    parallel_walk: Option<bool>,
    strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeSection {
    url: Option<String>,
    dest: Option<PathBuf>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LogSection {
    file: Option<PathBuf>,
    level: Option<String>,
    utc: Option<bool>,
    plain: Option<bool>,
}

/// Parse config text. Errors are logged and yield `None`.
pub fn parse_fanpipe_toml(s: &str, origin: &Path) -> Option<FanpipeToml> {
    toml::from_str(s)
        .map_err(|e| log::warn!("{}: {}", origin.display(), e))
        .ok()
}

/// Load the config file at `path`. Returns None if it is missing or unreadable.
pub fn load_fanpipe_toml(path: &Path) -> Option<FanpipeToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_fanpipe_toml(&s, path)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

impl FanpipeToml {
    /// Apply `[pipeline]` and `[copy]` to `opts` (only fields present in the file). Call before applying CLI.
    pub fn apply_to_copy(&self, opts: &mut CopyOpts) {
        if self.pipeline.workers.is_some() {
            opts.workers = self.pipeline.workers;
        }
        apply_file_opt!(self.pipeline, opts, verbose => verbose);
        let sec = &self.copy;
        apply_file_opt!(sec, opts, src => src);
        apply_file_opt!(sec, opts, dest => dest);
        apply_file_opt!(sec, opts, exclude => exclude);
        apply_file_opt!(sec, opts, follow_links => follow_links);
        apply_file_opt!(sec, opts, parallel_walk => parallel_walk);
        apply_file_opt!(sec, opts, strict => strict);
    }

    /// Apply `[pipeline]` and `[scrape]` to `opts`. Call before applying CLI.
    pub fn apply_to_scrape(&self, opts: &mut ScrapeOpts) {
        if self.pipeline.workers.is_some() {
            opts.workers = self.pipeline.workers;
        }
        apply_file_opt!(self.pipeline, opts, verbose => verbose);
        let sec = &self.scrape;
        apply_file_opt!(sec, opts, url => page_url);
        apply_file_opt!(sec, opts, dest => dest);
        apply_file_opt!(sec, opts, retries => retries);
        if let Some(secs) = sec.timeout_secs {
            opts.timeout = Duration::from_secs(secs);
        }
    }

    /// Apply `[log]` to `config`. A log file implies the plain format unless `plain = false`.
    pub fn apply_to_log(&self, config: &mut LogConfig) {
        let sec = &self.log;
        if let Some(file) = &sec.file {
            config.sink = LogSink::File(file.clone());
            config.format = LogFormat::Plain;
        }
        if let Some(level) = sec.level.as_deref() {
            match LevelFilter::from_str(level) {
                Ok(l) => config.min_level = l,
                Err(_) => log::warn!("[log] level: unknown level '{}'", level),
            }
        }
        if let Some(utc) = sec.utc {
            config.time_zone = if utc {
                LogTimeZone::Utc
            } else {
                LogTimeZone::Local
            };
        }
        if let Some(plain) = sec.plain {
            config.format = if plain {
                LogFormat::Plain
            } else {
                LogFormat::Colored
            };
        }
    }
}
