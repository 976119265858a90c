//! Decides whether a file needs a trailing newline and whether touching it is
//! safe. The last byte is always checked before any content is sampled.

use crate::buffer_pool::BufferPool;
use crate::config::ExtensionTable;
use crate::error::ClassifyError;
use crate::models::{FileOutcome, FileTask, SkipReason};
use crate::mutator;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skip(SkipReason),
    NeedsFix,
}

pub fn classify(
    path: &Path,
    size: u64,
    table: &ExtensionTable,
    buffers: &BufferPool,
) -> Result<Verdict, ClassifyError> {
    if size == 0 {
        return Ok(Verdict::Skip(SkipReason::Empty));
    }

    let ext = extension_of(path);
    if ext.as_deref().is_some_and(|e| table.is_skipped(e)) {
        return Ok(Verdict::Skip(SkipReason::SkippedExtension));
    }

    let last = read_last_byte(path, size).map_err(|e| ClassifyError::io(path, e))?;
    if last == b'\n' {
        return Ok(Verdict::Skip(SkipReason::AlreadyTerminated));
    }

    if ext.as_deref().is_some_and(|e| table.is_text(e)) {
        return Ok(Verdict::NeedsFix);
    }

    // Unreadable samples count as binary so the file is left alone.
    match looks_binary(path, buffers) {
        Ok(false) => Ok(Verdict::NeedsFix),
        Ok(true) => Ok(Verdict::Skip(SkipReason::Binary)),
        Err(e) => {
            debug!("Sampling {:?} failed, assuming binary: {}", path, e);
            Ok(Verdict::Skip(SkipReason::Binary))
        }
    }
}

/// Classifies one task and appends the newline when needed.
pub fn process_file(task: &FileTask, table: &ExtensionTable, buffers: &BufferPool) -> FileOutcome {
    match classify(&task.path, task.size, table, buffers) {
        Ok(Verdict::Skip(reason)) => {
            debug!(path = ?task.path, ?reason, "unchanged");
            FileOutcome::Unchanged(reason)
        }
        Ok(Verdict::NeedsFix) => append_outcome(&task.path, mutator::append_newline(&task.path)),
        Err(e) => {
            let counted = !e.is_permission_denied();
            if counted {
                warn!("{}", e);
            } else {
                debug!("{}", e);
            }
            FileOutcome::Failed { counted }
        }
    }
}

/// A failed append is counted unless it was refused for lack of permission.
fn append_outcome(path: &Path, result: io::Result<()>) -> FileOutcome {
    match result {
        Ok(()) => {
            debug!(path = ?path, "appended newline");
            FileOutcome::Fixed
        }
        Err(e) => {
            let counted = e.kind() != io::ErrorKind::PermissionDenied;
            warn!("Failed to append newline to {:?}: {}", path, e);
            FileOutcome::Failed { counted }
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn read_last_byte(path: &Path, size: u64) -> io::Result<u8> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(size - 1))?;
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// A NUL byte anywhere in the leading sample marks the file as binary.
fn looks_binary(path: &Path, buffers: &BufferPool) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = buffers.acquire();
    let n = read_prefix(&mut file, &mut buf)?;
    Ok(buf[..n].contains(&0))
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
