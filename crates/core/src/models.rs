use serde::Serialize;
use std::fs::Metadata;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// A regular file discovered by the walker, handed to exactly one worker.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub size: u64,
    pub metadata: Metadata,
}

impl FileTask {
    pub fn new(path: PathBuf, metadata: Metadata) -> Self {
        Self {
            path,
            size: metadata.len(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    SkippedExtension,
    AlreadyTerminated,
    Binary,
}

/// What happened to one file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged(SkipReason),
    Fixed,
    /// Reading or appending failed. `counted` is false for permission errors.
    Failed { counted: bool },
}

/// Shared counters updated by every worker. Increments only; `processed` is
/// always bumped before the outcome counters.
#[derive(Debug, Default)]
pub struct RunCounters {
    processed: AtomicU64,
    modified: AtomicU64,
    errors: AtomicU64,
}

impl RunCounters {
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_modified(&self) {
        self.modified.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_outcome(&self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Fixed => self.record_modified(),
            FileOutcome::Failed { counted: true } => self.record_error(),
            FileOutcome::Failed { counted: false } | FileOutcome::Unchanged(_) => {}
        }
    }

    /// Outcome counters are read before `processed`, so the snapshot never
    /// shows more modifications or errors than processed files.
    pub fn snapshot(&self, interrupted: bool) -> RunSummary {
        let modified = self.modified.load(Ordering::SeqCst);
        let errors = self.errors.load(Ordering::SeqCst);
        let processed = self.processed.load(Ordering::SeqCst);
        RunSummary {
            processed,
            modified,
            errors,
            interrupted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: u64,
    pub modified: u64,
    pub errors: u64,
    pub interrupted: bool,
}
