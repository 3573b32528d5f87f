//! CLI command handler: build options from config file + flags, set up logging, run.

use anyhow::{Result, bail};
use log::{debug, error, info};
use std::time::Duration;

use crate::copy::copy_tree;
use crate::engine::arg_parser::{Cli, Commands, CommonArgs, CopyArgs, ScrapeArgs};
use crate::pipeline::CancelToken;
use crate::scrape::scrape_images;
use crate::types::{CopyOpts, RunSummary, ScrapeOpts};
use crate::utils::config::PackagePaths;
use crate::utils::fanpipe_toml::{FanpipeToml, load_fanpipe_toml};
use crate::utils::logger::{LogConfig, LogFormat, LogSink, LogTimeZone, init_logging};

fn load_config_file(common: &CommonArgs) -> FanpipeToml {
    let path = common
        .config
        .clone()
        .unwrap_or_else(|| PackagePaths::get().config_filename().into());
    load_fanpipe_toml(&path).unwrap_or_default()
}

/// Log config: file first, then flags. A log file means plain lines unless `--plain false`.
pub fn setup_log_config(common: &CommonArgs, file: &FanpipeToml) -> LogConfig {
    let mut config = LogConfig::default();
    file.apply_to_log(&mut config);
    if let Some(path) = &common.log_file {
        config.sink = LogSink::File(path.clone());
        config.format = LogFormat::Plain;
    }
    if let Some(utc) = common.utc {
        config.time_zone = if utc {
            LogTimeZone::Utc
        } else {
            LogTimeZone::Local
        };
    }
    if let Some(plain) = common.plain {
        config.format = if plain {
            LogFormat::Plain
        } else {
            LogFormat::Colored
        };
    }
    config.verbose(common.verbose.unwrap_or(false))
}

pub fn setup_copy_opts(args: &CopyArgs, common: &CommonArgs, file: &FanpipeToml) -> CopyOpts {
    let mut opts = CopyOpts::default();
    file.apply_to_copy(&mut opts);
    if let Some(src) = &args.src {
        opts.src = src.clone();
    }
    if let Some(dest) = &args.dest {
        opts.dest = dest.clone();
    }
    if !args.exclude.is_empty() {
        opts.exclude = args.exclude.clone();
    }
    if common.workers.is_some() {
        opts.workers = common.workers;
    }
    opts.follow_links = args.follow_links.unwrap_or(opts.follow_links);
    opts.parallel_walk = args.parallel_walk.unwrap_or(opts.parallel_walk);
    opts.strict = args.strict.unwrap_or(opts.strict);
    opts.verbose = common.verbose.unwrap_or(opts.verbose);
    opts
}

pub fn setup_scrape_opts(args: &ScrapeArgs, common: &CommonArgs, file: &FanpipeToml) -> ScrapeOpts {
    let mut opts = ScrapeOpts::default();
    file.apply_to_scrape(&mut opts);
    if let Some(url) = &args.url {
        opts.page_url = url.clone();
    }
    if let Some(dest) = &args.dest {
        opts.dest = dest.clone();
    }
    if let Some(secs) = args.timeout {
        opts.timeout = Duration::from_secs(secs);
    }
    if common.workers.is_some() {
        opts.workers = common.workers;
    }
    opts.retries = args.retries.unwrap_or(opts.retries);
    opts.verbose = common.verbose.unwrap_or(opts.verbose);
    opts
}

/// Run the chosen subcommand. Returns the process exit code: 0 only when every item succeeded.
pub fn handle_run(cli: &Cli) -> Result<i32> {
    let file = load_config_file(&cli.common);
    init_logging(&setup_log_config(&cli.common, &file))?;

    let cancel = CancelToken::new();
    cancel.cancel_on_ctrlc()?;

    let summary = match &cli.command {
        Commands::Copy(args) => {
            let opts = setup_copy_opts(args, &cli.common, &file);
            if opts.src.as_os_str().is_empty() || opts.dest.as_os_str().is_empty() {
                bail!("copy needs --src and --dest (or [copy] src/dest in the config file)");
            }
            info!("Starting copy operation");
            debug!("{:#?}", opts);
            run_logged(copy_tree(&opts, &cancel))?
        }
        Commands::Scrape(args) => {
            let opts = setup_scrape_opts(args, &cli.common, &file);
            if opts.page_url.is_empty() {
                bail!("scrape needs --url (or [scrape] url in the config file)");
            }
            info!("Starting image download from {}", opts.page_url);
            debug!("{:#?}", opts);
            run_logged(scrape_images(&opts, &cancel))?
        }
    };
    if summary.interrupted {
        error!("Run cancelled by user");
    }
    Ok(summary.exit_code())
}

/// Log a run-level failure at error level before handing it back.
fn run_logged(result: Result<RunSummary>) -> Result<RunSummary> {
    result.inspect_err(|e| error!("{:#}", e))
}
