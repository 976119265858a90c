//! Walks a root path on a blocking thread and streams regular files through a
//! bounded channel. A full channel suspends the walk.

use crate::config::Exclusions;
use crate::models::FileTask;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Receiving side of one walk. Dropping `receiver` stops the walker.
pub struct WalkHandle {
    pub receiver: mpsc::Receiver<FileTask>,
    pub join: JoinHandle<()>,
}

/// Starts walking `root`. Excluded directories are pruned without descending,
/// symlinks are neither followed nor emitted, and entries that fail to read
/// are skipped.
pub fn walk(
    root: PathBuf,
    exclusions: Arc<Exclusions>,
    capacity: usize,
    cancel: CancellationToken,
) -> WalkHandle {
    let (tx, receiver) = mpsc::channel(capacity.max(1));

    let join = task::spawn_blocking(move || {
        let entries = WalkDir::new(&root)
            .follow_links(false)
            .follow_root_links(false)
            .into_iter()
            .filter_entry(|e| !is_pruned(e, &exclusions));

        let mut sent = 0u64;
        for entry in entries {
            if cancel.is_cancelled() {
                debug!(root = ?root, sent, "walk cancelled");
                return;
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || exclusions.matches_glob(entry.path()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };

            if tx
                .blocking_send(FileTask::new(entry.into_path(), metadata))
                .is_err()
            {
                // Receiver dropped, stop walking.
                debug!(root = ?root, sent, "receiver closed");
                return;
            }
            sent += 1;
        }
        debug!(root = ?root, sent, "walk finished");
    });

    WalkHandle { receiver, join }
}

fn is_pruned(entry: &DirEntry, exclusions: &Exclusions) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let by_name = entry
        .file_name()
        .to_str()
        .is_some_and(|name| exclusions.is_excluded_dir_name(name));
    by_name || exclusions.matches_glob(entry.path())
}
