//! Per-item download: GET one image URL and stream it into the destination directory.

use log::{debug, warn};
use reqwest::blocking::Client;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use url::Url;

use crate::error::ProcessingError;
use crate::pipeline::{CancelToken, ItemProcessor};
use crate::types::WorkItem;
use crate::utils::config::{COPY_CHUNK_SIZE, ScrapeDefaults};

/// Fallback name for URLs whose path has no usable last segment.
const FALLBACK_NAME: &str = "image";

/// Last non-empty path segment of `url`, if it is a plain file name.
pub fn file_name_for(url: &Url) -> Option<String> {
    let name = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.to_string())
}

/// Give every URL a distinct file name: `logo.png`, `logo-1.png`, `logo-2.png`...
/// Computed once before the run so workers never race on the same file.
pub fn assign_file_names(urls: &[Url]) -> HashMap<Url, String> {
    let mut taken = HashSet::new();
    let mut names = HashMap::with_capacity(urls.len());
    for url in urls {
        let base = file_name_for(url).unwrap_or_else(|| FALLBACK_NAME.to_string());
        let (stem, ext) = match base.rfind('.') {
            Some(i) if i > 0 => (&base[..i], &base[i..]),
            _ => (base.as_str(), ""),
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while !taken.insert(candidate.to_ascii_lowercase()) {
            candidate = format!("{}-{}{}", stem, n, ext);
            n += 1;
        }
        names.insert(url.clone(), candidate);
    }
    names
}

/// Downloads URL items into `dest_dir`. Transient failures are retried up to `retries` times.
#[derive(Clone, Debug)]
pub struct DownloadProcessor {
    client: Client,
    dest_dir: PathBuf,
    names: Arc<HashMap<Url, String>>,
    retries: u32,
}

impl DownloadProcessor {
    pub fn new(client: Client, dest_dir: PathBuf, names: HashMap<Url, String>, retries: u32) -> Self {
        Self {
            client,
            dest_dir,
            names: Arc::new(names),
            retries,
        }
    }

    pub fn dest_path_for(&self, url: &Url) -> PathBuf {
        let name = self
            .names
            .get(url)
            .cloned()
            .or_else(|| file_name_for(url))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        self.dest_dir.join(name)
    }

    fn download(&self, url: &Url, cancel: &CancelToken) -> Result<PathBuf, ProcessingError> {
        let dest = self.dest_path_for(url);
        let mut attempt = 0;
        loop {
            match download_once(&self.client, url, &dest, cancel) {
                Ok(bytes) => {
                    debug!("Downloaded {} bytes from {} to {}", bytes, url, dest.display());
                    return Ok(dest);
                }
                Err(e) if e.is_transient() && attempt < self.retries && !cancel.is_cancelled() => {
                    attempt += 1;
                    warn!(
                        "Attempt {} for {} failed ({}), retrying",
                        attempt, url, e
                    );
                    thread::sleep(ScrapeDefaults::RETRY_BACKOFF * attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl ItemProcessor for DownloadProcessor {
    fn process(
        &self,
        item: &WorkItem,
        cancel: &CancelToken,
    ) -> Result<Option<String>, ProcessingError> {
        match item {
            WorkItem::Url(url) => {
                let dest = self.download(url, cancel)?;
                Ok(Some(dest.display().to_string()))
            }
            WorkItem::Path(p) => Err(ProcessingError::Other(format!(
                "download cannot handle path item {}",
                p.display()
            ))),
        }
    }
}

/// One GET + write. A partially written file is removed on failure.
fn download_once(
    client: &Client,
    url: &Url,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<u64, ProcessingError> {
    debug!("Starting download of {}", url);
    let mut resp = client
        .get(url.clone())
        .send()
        .map_err(|source| ProcessingError::Http {
            url: url.to_string(),
            source,
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ProcessingError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let mut file = File::create(dest).map_err(|e| ProcessingError::io(dest, e))?;
    let written = stream_to_file(&mut resp, &mut file, dest, url, cancel);
    drop(file);
    if written.is_err() {
        let _ = fs::remove_file(dest);
    }
    written
}

/// Copy `body` into `file` chunk by chunk, checking `cancel` between chunks.
pub fn stream_to_file<R: Read>(
    body: &mut R,
    file: &mut File,
    dest: &Path,
    url: &Url,
    cancel: &CancelToken,
) -> Result<u64, ProcessingError> {
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut total = 0_u64;
    loop {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ProcessingError::Body {
                    url: url.to_string(),
                    source,
                });
            }
        };
        file.write_all(&buf[..n])
            .map_err(|e| ProcessingError::io(dest, e))?;
        total += n as u64;
    }
    file.flush().map_err(|e| ProcessingError::io(dest, e))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(
            file_name_for(&url("https://x.org/a/b/logo.png?v=2")).as_deref(),
            Some("logo.png")
        );
        assert_eq!(
            file_name_for(&url("https://x.org/a/pic.jpg/")).as_deref(),
            Some("pic.jpg")
        );
        assert_eq!(file_name_for(&url("https://x.org/")), None);
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let urls = vec![
            url("https://x.org/a/logo.png"),
            url("https://x.org/b/logo.png"),
            url("https://x.org/c/LOGO.png"),
            url("https://x.org/"),
        ];
        let names = assign_file_names(&urls);
        assert_eq!(names[&urls[0]], "logo.png");
        assert_eq!(names[&urls[1]], "logo-1.png");
        assert_eq!(names[&urls[2]], "LOGO-2.png");
        assert_eq!(names[&urls[3]], "image");
    }

    #[test]
    fn stream_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let mut file = File::create(&dest).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut body: &[u8] = b"abc";
        let err = stream_to_file(&mut body, &mut file, &dest, &url("http://x/out.bin"), &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn stream_copies_all_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let mut file = File::create(&dest).unwrap();
        let data = vec![7u8; COPY_CHUNK_SIZE * 2 + 5];
        let mut body: &[u8] = &data;
        let n = stream_to_file(
            &mut body,
            &mut file,
            &dest,
            &url("http://x/out.bin"),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), data);
    }
}
