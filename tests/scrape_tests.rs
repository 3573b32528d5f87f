//! Image scraper against a loopback HTTP server.

use fanpipe::scrape::{extract_image_links, scrape_images_with};
use fanpipe::{CancelToken, PipelineError, PipelineState, ProcessingError, ScrapeOpts, scrape_images};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use url::Url;

type Route = dyn Fn(&str) -> (u16, Vec<u8>) + Send + Sync;

/// Serve `route(path)` for every request, one connection per request. Returns the base URL.
fn serve(route: Arc<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let route = Arc::clone(&route);
            thread::spawn(move || handle(stream, route.as_ref()));
        }
    });
    format!("http://{}", addr)
}

fn handle(mut stream: TcpStream, route: &Route) {
    let mut req = Vec::new();
    let mut buf = [0u8; 1024];
    while !req.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => req.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&req);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, body) = route(&path);
    let header = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
}

const PAGE: &str = r#"<html><body>
  <img src="/img/logo.png">
  <img src="img/photo.JPG?size=large">
  <img src="/img/missing.gif">
  <img src="/js/app.js">
  <img alt="no source">
  <img src="/img/logo.png">
</body></html>"#;

fn gallery_route(path: &str) -> (u16, Vec<u8>) {
    match path {
        "/index.html" => (200, PAGE.as_bytes().to_vec()),
        "/empty.html" => (200, b"<html><p>nothing</p></html>".to_vec()),
        "/img/logo.png" => (200, b"PNGDATA".to_vec()),
        "/img/photo.JPG?size=large" => (200, vec![9u8; 100_000]),
        _ => (404, b"not found".to_vec()),
    }
}

fn scrape_opts(page_url: String, dest: &Path) -> ScrapeOpts {
    ScrapeOpts {
        page_url,
        dest: dest.to_path_buf(),
        workers: Some(2),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

#[test]
fn extracts_resolved_unique_image_links() {
    let base = Url::parse("https://example.org/gallery/index.html").unwrap();
    let links: Vec<String> = extract_image_links(PAGE, &base)
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(
        links,
        vec![
            "https://example.org/img/logo.png",
            "https://example.org/gallery/img/photo.JPG?size=large",
            "https://example.org/img/missing.gif",
        ]
    );
}

#[test]
fn non_http_sources_are_dropped() {
    let base = Url::parse("https://example.org/").unwrap();
    let html = r#"<img src="data:image/png;base64,AAAA.png"><img src="ftp://x.org/a.png">"#;
    assert!(extract_image_links(html, &base).is_empty());
}

#[test]
fn downloads_every_image_and_reports_failures() {
    let base = serve(Arc::new(gallery_route));
    let dest = tempfile::tempdir().unwrap();
    let images = dest.path().join("images");
    let mut failures = Vec::new();
    let summary = scrape_images_with(
        &scrape_opts(format!("{base}/index.html"), &images),
        &CancelToken::new(),
        |o| {
            if let Some(e) = o.error {
                failures.push((o.item.to_string(), e));
            }
        },
    )
    .unwrap();

    assert_eq!(summary.produced, 3);
    assert_eq!(summary.received, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.exit_code(), 1);

    assert_eq!(std::fs::read(images.join("logo.png")).unwrap(), b"PNGDATA");
    assert_eq!(std::fs::read(images.join("photo.JPG")).unwrap().len(), 100_000);
    assert!(!images.join("missing.gif").exists());

    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("/img/missing.gif"));
    assert!(matches!(
        failures[0].1,
        ProcessingError::Status { status: 404, .. }
    ));
}

#[test]
fn page_without_images_finishes_with_zero_outcomes() {
    let base = serve(Arc::new(gallery_route));
    let dest = tempfile::tempdir().unwrap();
    let summary = scrape_images(
        &scrape_opts(format!("{base}/empty.html"), dest.path()),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(summary.received, 0);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.state, PipelineState::Done);
}

#[test]
fn unreachable_page_is_an_enumeration_error() {
    let base = serve(Arc::new(gallery_route));
    let dest = tempfile::tempdir().unwrap();
    let err = scrape_images(
        &scrape_opts(format!("{base}/nope.html"), dest.path()),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Enumeration(_))
    ));
}

#[test]
fn malformed_page_url_is_a_config_error() {
    let dest = tempfile::tempdir().unwrap();
    let err = scrape_images(
        &scrape_opts("not a url".to_string(), dest.path()),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Config(_))
    ));
}

fn flaky_route(hits: Arc<AtomicUsize>) -> Arc<Route> {
    Arc::new(move |path: &str| match path {
        "/page.html" => (200, br#"<img src="/flaky.png">"#.to_vec()),
        "/flaky.png" => {
            if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                (503, b"busy".to_vec())
            } else {
                (200, b"OK".to_vec())
            }
        }
        _ => (404, Vec::new()),
    })
}

#[test]
fn transient_failure_is_retried_when_allowed() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(flaky_route(Arc::clone(&hits)));
    let dest = tempfile::tempdir().unwrap();
    let mut opts = scrape_opts(format!("{base}/page.html"), dest.path());
    opts.retries = 2;
    let summary = scrape_images(&opts, &CancelToken::new()).unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read(dest.path().join("flaky.png")).unwrap(), b"OK");
}

#[test]
fn transient_failure_is_final_without_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(flaky_route(Arc::clone(&hits)));
    let dest = tempfile::tempdir().unwrap();
    let summary = scrape_images(
        &scrape_opts(format!("{base}/page.html"), dest.path()),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
