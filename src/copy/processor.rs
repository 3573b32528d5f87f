//! Per-item copy: mirror one source entry under the destination root.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::engine::tools::path_relative_to;
use crate::error::ProcessingError;
use crate::pipeline::{CancelToken, ItemProcessor};
use crate::types::WorkItem;
use crate::utils::config::COPY_CHUNK_SIZE;

/// Copies `src_root/<rel>` to `dest_root/<rel>`. Directories are created with the source's mode;
/// files are copied in chunks that stop on cancel, then given the source file's permissions.
#[derive(Clone, Debug)]
pub struct CopyProcessor {
    src_root: PathBuf,
    dest_root: PathBuf,
}

impl CopyProcessor {
    pub fn new(src_root: PathBuf, dest_root: PathBuf) -> Self {
        Self {
            src_root,
            dest_root,
        }
    }

    /// Where `path` lands under the destination root.
    pub fn dest_path_for(&self, path: &Path) -> Result<PathBuf, ProcessingError> {
        let rel = path_relative_to(path, &self.src_root).ok_or_else(|| {
            ProcessingError::Other(format!(
                "{} is not under {}",
                path.display(),
                self.src_root.display()
            ))
        })?;
        Ok(self.dest_root.join(rel))
    }

    fn copy_entry(&self, path: &Path, cancel: &CancelToken) -> Result<PathBuf, ProcessingError> {
        let dest = self.dest_path_for(path)?;
        let meta = fs::metadata(path).map_err(|e| ProcessingError::io(path, e))?;
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        if meta.is_dir() {
            // Already-existing directories are fine (a file in it may have been copied first).
            fs::create_dir_all(&dest).map_err(|e| ProcessingError::io(&dest, e))?;
            apply_dir_mode(&dest, &meta)?;
        } else {
            // Workers race: a file can be picked up before its parent directory item.
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ProcessingError::io(parent, e))?;
            }
            copy_file(path, &dest, &meta, cancel)?;
        }
        Ok(dest)
    }
}

fn copy_file(
    src: &Path,
    dest: &Path,
    src_meta: &fs::Metadata,
    cancel: &CancelToken,
) -> Result<u64, ProcessingError> {
    let mut reader = File::open(src).map_err(|e| ProcessingError::io(src, e))?;
    let copied = write_cancellable(&mut reader, src, dest, cancel)?;
    fs::set_permissions(dest, src_meta.permissions()).map_err(|e| ProcessingError::io(dest, e))?;
    Ok(copied)
}

/// Create `dest` and fill it from `reader`, checking `cancel` between chunks.
/// A partially written `dest` is removed on any failure.
fn write_cancellable<R: Read>(
    reader: &mut R,
    src: &Path,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<u64, ProcessingError> {
    let mut out = File::create(dest).map_err(|e| ProcessingError::io(dest, e))?;
    let result = copy_chunks(reader, &mut out, src, dest, cancel);
    if result.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(dest) {
            log::warn!("Could not remove partial copy {}: {}", dest.display(), e);
        }
    }
    result
}

fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    out: &mut W,
    src: &Path,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<u64, ProcessingError> {
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut total = 0_u64;
    loop {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProcessingError::io(src, e)),
        };
        out.write_all(&buf[..n])
            .map_err(|e| ProcessingError::io(dest, e))?;
        total += n as u64;
    }
    out.flush().map_err(|e| ProcessingError::io(dest, e))?;
    Ok(total)
}

impl ItemProcessor for CopyProcessor {
    fn process(
        &self,
        item: &WorkItem,
        cancel: &CancelToken,
    ) -> Result<Option<String>, ProcessingError> {
        match item {
            WorkItem::Path(path) => {
                let dest = self.copy_entry(path, cancel)?;
                log::debug!("Copied {} to {}", path.display(), dest.display());
                Ok(Some(dest.display().to_string()))
            }
            WorkItem::Url(u) => Err(ProcessingError::Other(format!(
                "copy cannot handle URL item {}",
                u
            ))),
        }
    }
}

/// Give `dest` the source directory's mode, keeping owner rwx so the tree can still be filled.
#[cfg(unix)]
fn apply_dir_mode(dest: &Path, src_meta: &fs::Metadata) -> Result<(), ProcessingError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = src_meta.permissions().mode() | 0o700;
    fs::set_permissions(dest, fs::Permissions::from_mode(mode))
        .map_err(|e| ProcessingError::io(dest, e))
}

#[cfg(not(unix))]
fn apply_dir_mode(_dest: &Path, _src_meta: &fs::Metadata) -> Result<(), ProcessingError> {
    Ok(())
}
