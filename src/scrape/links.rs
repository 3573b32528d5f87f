//! Page fetch and image link extraction.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::utils::config::IMAGE_EXTENSIONS;

/// True when the link's path (query and fragment ignored) ends with a known image extension.
pub fn has_image_extension(link: &str) -> bool {
    let end = link.find(['?', '#']).unwrap_or(link.len());
    let path = link[..end].to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Resolve `link` against the page URL. Absolute links come back unchanged.
pub fn to_absolute_url(base: &Url, link: &str) -> Option<Url> {
    base.join(link.trim()).ok()
}

/// `src` of every `<img>` that looks like an image file, resolved and de-duplicated in page order.
pub fn extract_image_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| has_image_extension(src))
        .filter_map(|src| to_absolute_url(base, src))
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

/// GET the page and return its body. Non-2xx answers are errors.
pub fn fetch_page(client: &Client, page_url: &Url) -> Result<String> {
    let resp = client
        .get(page_url.clone())
        .send()
        .with_context(|| format!("fetch page {}", page_url))?
        .error_for_status()
        .with_context(|| format!("fetch page {}", page_url))?;
    resp.text()
        .with_context(|| format!("read page body {}", page_url))
}

/// Fetch `page_url` and extract its image links.
pub fn fetch_image_links(client: &Client, page_url: &Url) -> Result<Vec<Url>> {
    let html = fetch_page(client, page_url)?;
    Ok(extract_image_links(&html, page_url))
}
