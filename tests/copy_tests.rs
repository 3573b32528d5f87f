//! Directory copy end to end on temp trees.

use fanpipe::copy::{CopyProcessor, WalkSource, check_copy_roots};
use fanpipe::{
    CancelToken, CopyOpts, ItemProcessor, PipelineError, PipelineState, SourceEvent, WorkItem,
    copy_tree, copy_tree_with,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 3 files at the top, one subdirectory holding 2 more: 6 entries besides the root.
fn sample_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("b.txt"), b"bravo").unwrap();
    fs::write(root.join("c.bin"), [0u8, 1, 2, 3]).unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/d.txt"), b"delta").unwrap();
    fs::write(root.join("sub/e.txt"), b"echo").unwrap();
    dir
}

/// relative path -> Some(contents) for files, None for directories.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let body = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, body)
        })
        .collect()
}

fn opts(src: &Path, dest: &Path, workers: usize) -> CopyOpts {
    CopyOpts {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        workers: Some(workers),
        ..Default::default()
    }
}

#[test]
fn copies_sample_tree_with_two_workers() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let mut locations = Vec::new();
    let summary = copy_tree_with(&opts(src.path(), dest.path(), 2), &CancelToken::new(), |o| {
        assert!(o.is_success(), "{:?}", o.error);
        locations.push(PathBuf::from(o.location.unwrap()));
    })
    .unwrap();

    assert_eq!(summary.produced, 6);
    assert_eq!(summary.received, 6);
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(snapshot(src.path()), snapshot(dest.path()));

    let dest_root = dest.path().canonicalize().unwrap();
    assert!(locations.iter().all(|l| l.starts_with(&dest_root)));
}

#[test]
fn parallel_walk_copies_the_same_tree() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let mut o = opts(src.path(), dest.path(), 4);
    o.parallel_walk = true;
    let summary = copy_tree(&o, &CancelToken::new()).unwrap();
    assert_eq!(summary.succeeded, 6);
    assert_eq!(snapshot(src.path()), snapshot(dest.path()));
}

#[test]
fn single_and_many_workers_agree() {
    let src = sample_tree();
    let one = tempfile::tempdir().unwrap();
    let eight = tempfile::tempdir().unwrap();
    let s1 = copy_tree(&opts(src.path(), one.path(), 1), &CancelToken::new()).unwrap();
    let s8 = copy_tree(&opts(src.path(), eight.path(), 8), &CancelToken::new()).unwrap();
    assert_eq!((s1.succeeded, s1.failed), (s8.succeeded, s8.failed));
    assert_eq!(snapshot(one.path()), snapshot(eight.path()));
}

#[test]
fn empty_source_copies_nothing() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    let summary = copy_tree(&opts(src.path(), dest.path(), 3), &CancelToken::new()).unwrap();
    assert_eq!(summary.received, 0);
    assert_eq!(summary.state, PipelineState::Done);
    assert!(snapshot(dest.path()).is_empty());
}

#[test]
fn missing_destination_is_fatal_before_start() {
    let src = sample_tree();
    let parent = tempfile::tempdir().unwrap();
    let dest = parent.path().join("not-there");
    let err = copy_tree(&opts(src.path(), &dest, 2), &CancelToken::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Config(_))
    ));
    assert!(!dest.exists());
}

#[test]
fn destination_inside_source_is_rejected() {
    let src = sample_tree();
    let o = opts(src.path(), &src.path().join("sub"), 2);
    assert!(matches!(check_copy_roots(&o), Err(PipelineError::Config(_))));
}

#[test]
fn zero_workers_is_rejected() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let err = copy_tree(&opts(src.path(), dest.path(), 0), &CancelToken::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidWorkers(0))
    ));
}

#[test]
fn one_bad_entry_fails_alone() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    // A directory squatting on a file's destination makes that one copy fail.
    fs::create_dir(dest.path().join("b.txt")).unwrap();
    let mut failed = Vec::new();
    let summary = copy_tree_with(&opts(src.path(), dest.path(), 3), &CancelToken::new(), |o| {
        if o.error.is_some() {
            failed.push(o.item.to_string());
        }
    })
    .unwrap();
    assert_eq!(summary.received, 6);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 5);
    assert_eq!(summary.exit_code(), 1);
    assert!(failed[0].ends_with("b.txt"));
    assert_eq!(fs::read(dest.path().join("sub/e.txt")).unwrap(), b"echo");
}

#[test]
fn excluded_directories_are_not_descended() {
    let src = sample_tree();
    fs::create_dir(src.path().join("node_modules")).unwrap();
    fs::write(src.path().join("node_modules/dep.js"), b"x").unwrap();
    fs::write(src.path().join("trace.log"), b"x").unwrap();
    let dest = tempfile::tempdir().unwrap();
    let mut o = opts(src.path(), dest.path(), 2);
    o.exclude = vec!["node_modules".into(), "*.log".into()];
    let summary = copy_tree(&o, &CancelToken::new()).unwrap();
    assert_eq!(summary.received, 6);
    assert!(!dest.path().join("node_modules").exists());
    assert!(!dest.path().join("trace.log").exists());
}

#[test]
fn walk_source_skips_root_and_emits_everything_else() {
    let src = sample_tree();
    let root = src.path().canonicalize().unwrap();
    let source = WalkSource::new(root.clone(), &CopyOpts::default());
    let mut items: Vec<PathBuf> = source
        .into_iter()
        .map(|ev| match ev {
            SourceEvent::Item(WorkItem::Path(p)) => p.strip_prefix(&root).unwrap().to_path_buf(),
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    items.sort();
    let expected: Vec<PathBuf> = ["a.txt", "b.txt", "c.bin", "sub", "sub/d.txt", "sub/e.txt"]
        .iter()
        .map(PathBuf::from)
        .collect();
    assert_eq!(items, expected);
}

#[test]
fn missing_root_walk_is_fatal() {
    let parent = tempfile::tempdir().unwrap();
    let source = WalkSource::new(parent.path().join("gone"), &CopyOpts::default());
    let events: Vec<SourceEvent> = source.into_iter().collect();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SourceEvent::Fatal(_)));
}

#[test]
fn file_before_parent_dir_still_copies() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let src_root = src.path().canonicalize().unwrap();
    let processor = CopyProcessor::new(src_root.clone(), dest.path().to_path_buf());
    let item = WorkItem::Path(src_root.join("sub/d.txt"));
    let location = processor.process(&item, &CancelToken::new()).unwrap().unwrap();
    assert_eq!(fs::read(location).unwrap(), b"delta");
}

#[test]
fn processor_rejects_urls() {
    let processor = CopyProcessor::new(PathBuf::from("/a"), PathBuf::from("/b"));
    let item = WorkItem::Url(url::Url::parse("https://example.org/x.png").unwrap());
    assert!(processor.process(&item, &CancelToken::new()).is_err());
}

#[cfg(unix)]
#[test]
fn directory_mode_is_carried_over() {
    use std::os::unix::fs::PermissionsExt;
    let src = sample_tree();
    fs::set_permissions(src.path().join("sub"), fs::Permissions::from_mode(0o750)).unwrap();
    fs::set_permissions(src.path().join("a.txt"), fs::Permissions::from_mode(0o640)).unwrap();
    let dest = tempfile::tempdir().unwrap();
    copy_tree(&opts(src.path(), dest.path(), 2), &CancelToken::new()).unwrap();
    let dir_mode = fs::metadata(dest.path().join("sub")).unwrap().permissions().mode();
    let file_mode = fs::metadata(dest.path().join("a.txt")).unwrap().permissions().mode();
    assert_eq!(dir_mode & 0o777, 0o750);
    assert_eq!(file_mode & 0o777, 0o640);
}

#[test]
fn cancelled_processor_leaves_no_file() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let src_root = src.path().canonicalize().unwrap();
    let processor = CopyProcessor::new(src_root.clone(), dest.path().to_path_buf());
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = processor
        .process(&WorkItem::Path(src_root.join("a.txt")), &cancel)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(!dest.path().join("a.txt").exists());
}

#[test]
fn cancel_during_copy_keeps_only_whole_files() {
    let src = sample_tree();
    let dest = tempfile::tempdir().unwrap();
    let cancel = CancelToken::new();
    let trip = cancel.clone();
    let summary = copy_tree_with(&opts(src.path(), dest.path(), 1), &cancel, |_| trip.cancel())
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.exit_code(), 1);
    assert!(summary.received < 6 || summary.cancelled > 0);
    assert_eq!(summary.received, summary.produced);
    let copied = snapshot(dest.path());
    let original = snapshot(src.path());
    for (rel, body) in &copied {
        if body.is_some() {
            assert_eq!(body, &original[rel], "{} was copied partially", rel.display());
        }
    }
}
