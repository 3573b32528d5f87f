//! Source tree enumeration for the copier: walkdir (serial) or jwalk (parallel) mapped to
//! [`SourceEvent`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::tools::should_include_in_walk;
use crate::pipeline::SourceEvent;
use crate::types::{CopyOpts, WorkItem};

/// Walk description. Cheap to move into the producer thread; the walker itself is built there.
#[derive(Clone, Debug)]
pub struct WalkSource {
    pub root: PathBuf,
    pub exclude: Arc<Vec<String>>,
    pub follow_links: bool,
    pub parallel: bool,
    pub strict: bool,
}

impl WalkSource {
    /// `root` must already be canonical.
    pub fn new(root: PathBuf, opts: &CopyOpts) -> Self {
        Self {
            root,
            exclude: Arc::new(opts.exclude.clone()),
            follow_links: opts.follow_links,
            parallel: opts.parallel_walk,
            strict: opts.strict,
        }
    }
}

impl IntoIterator for WalkSource {
    type Item = SourceEvent;
    type IntoIter = Box<dyn Iterator<Item = SourceEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        if self.parallel {
            jwalk_iter(self)
        } else {
            walkdir_iter(self)
        }
    }
}

/// Map a walk error. An error on the root (depth 0) or any error in strict mode aborts enumeration.
fn error_event(msg: String, path: Option<&Path>, depth: usize, strict: bool) -> SourceEvent {
    if strict || depth == 0 {
        SourceEvent::Fatal(msg)
    } else {
        SourceEvent::Skipped {
            msg,
            item: path.map(|p| p.display().to_string()),
        }
    }
}

/// Convert a walkdir result into a [`SourceEvent`]; `None` for the root itself.
pub fn to_event_walkdir(
    r: Result<walkdir::DirEntry, walkdir::Error>,
    root: &Path,
    strict: bool,
) -> Option<SourceEvent> {
    match r {
        Ok(entry) if entry.depth() == 0 || entry.path() == root => None,
        Ok(entry) => Some(SourceEvent::Item(WorkItem::Path(entry.into_path()))),
        Err(err) => Some(error_event(
            format!("{}", err),
            err.path(),
            err.depth(),
            strict,
        )),
    }
}

/// Convert a jwalk result into a [`SourceEvent`]; `None` for the root itself.
pub fn to_event_jwalk(
    r: Result<jwalk::DirEntry<((), ())>, jwalk::Error>,
    root: &Path,
    strict: bool,
) -> Option<SourceEvent> {
    match r {
        Ok(entry) if entry.depth == 0 || entry.path() == root => None,
        Ok(entry) => Some(SourceEvent::Item(WorkItem::Path(entry.path()))),
        Err(err) => Some(error_event(
            format!("{}", err),
            err.path(),
            err.depth(),
            strict,
        )),
    }
}

/// Excluded and OS-hidden entries are pruned, so excluded directories are not descended into.
fn walkdir_iter(src: WalkSource) -> Box<dyn Iterator<Item = SourceEvent>> {
    use walkdir::WalkDir;
    let WalkSource {
        root,
        exclude,
        follow_links,
        strict,
        ..
    } = src;
    let filter_root = root.clone();
    Box::new(
        WalkDir::new(&root)
            .follow_links(follow_links)
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0 || should_include_in_walk(e.path(), &filter_root, &exclude)
            })
            .filter_map(move |r| to_event_walkdir(r, &root, strict)),
    )
}

fn jwalk_iter(src: WalkSource) -> Box<dyn Iterator<Item = SourceEvent>> {
    use jwalk::Parallelism;
    use std::time::Duration;
    let WalkSource {
        root,
        exclude,
        follow_links,
        strict,
        ..
    } = src;
    let filter_root = root.clone();
    Box::new(
        jwalk::WalkDir::new(&root)
            .follow_links(follow_links)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_secs(60),
            })
            .process_read_dir(move |_depth, _dir, _state, children| {
                children.retain(|child| match child {
                    Ok(e) => should_include_in_walk(&e.path(), &filter_root, &exclude),
                    Err(_) => true,
                });
            })
            .into_iter()
            .filter_map(move |r| to_event_jwalk(r, &root, strict)),
    )
}
