//! Image scraper on top of the pipeline: fetch a page, extract image links, download them with a
//! bounded worker pool, count outcomes to the known total.

pub mod download;
pub mod links;

use anyhow::{Context, Result};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use url::Url;

use crate::error::PipelineError;
use crate::pipeline::{self, CancelToken, SourceEvent};
use crate::types::{Outcome, PipelineConfig, RunSummary, ScrapeOpts, WorkItem};
use crate::utils::config::resolve_workers;

pub use download::{DownloadProcessor, assign_file_names, file_name_for};
pub use links::{extract_image_links, fetch_image_links, fetch_page, has_image_extension};

/// HTTP client shared by the page fetch and all download workers.
pub fn build_client(opts: &ScrapeOpts) -> Result<Client> {
    Client::builder()
        .timeout(opts.timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build HTTP client")
}

/// Download the images of `opts.page_url` into `opts.dest`.
pub fn scrape_images(opts: &ScrapeOpts, cancel: &CancelToken) -> Result<RunSummary> {
    scrape_images_with(opts, cancel, |_| {})
}

/// [`scrape_images`] with a callback for every outcome.
pub fn scrape_images_with<F>(
    opts: &ScrapeOpts,
    cancel: &CancelToken,
    on_outcome: F,
) -> Result<RunSummary>
where
    F: FnMut(Outcome),
{
    let page_url = Url::parse(&opts.page_url)
        .map_err(|e| PipelineError::Config(format!("page URL '{}': {}", opts.page_url, e)))?;
    let workers = resolve_workers(opts.workers)?;
    fs::create_dir_all(&opts.dest).map_err(|e| {
        PipelineError::Config(format!(
            "create destination {}: {}",
            opts.dest.display(),
            e
        ))
    })?;

    let client = build_client(opts)?;
    let links = fetch_image_links(&client, &page_url)
        .map_err(|e| PipelineError::Enumeration(format!("{:#}", e)))?;
    info!("Found {} images on page {}", links.len(), page_url);
    download_all(client, links, opts, workers, cancel, on_outcome)
}

/// Download already-discovered `links`. The count is known, so the collector counts outcomes.
pub fn download_all<F>(
    client: Client,
    links: Vec<Url>,
    opts: &ScrapeOpts,
    workers: usize,
    cancel: &CancelToken,
    on_outcome: F,
) -> Result<RunSummary>
where
    F: FnMut(Outcome),
{
    let config = PipelineConfig {
        workers,
        progress: opts.verbose,
        ..PipelineConfig::default()
    }
    .counted(links.len());
    let names = assign_file_names(&links);
    let processor = DownloadProcessor::new(client, opts.dest.clone(), names, opts.retries);
    let source: Vec<SourceEvent> = links
        .into_iter()
        .map(|u| SourceEvent::Item(WorkItem::Url(u)))
        .collect();
    pipeline::execute(source, processor, &config, cancel, on_outcome)
}
