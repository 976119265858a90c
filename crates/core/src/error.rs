use crate::models::RunSummary;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems building or validating a [`crate::ScanConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("extension '{ext}' is listed as both skipped and text")]
    OverlappingExtension { ext: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid exclude glob")]
    InvalidGlob(#[from] globset::Error),

    #[error("failed to load config")]
    Load(#[from] config::ConfigError),
}

/// Failure while inspecting a single file.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClassifyError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ClassifyError::Io {
            path: path.into(),
            source,
        }
    }

    /// Permission errors are expected noise (unreadable system files) and are
    /// not folded into the error counter.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            ClassifyError::Io { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
        }
    }
}

/// Run-level errors. Per-file problems never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("operation cancelled")]
    Cancelled { summary: RunSummary },

    #[error("worker pool closed unexpectedly")]
    PoolClosed,

    #[error("directory walker for {root:?} panicked")]
    WalkerPanicked { root: PathBuf },
}

impl ScanError {
    /// Counters accumulated before the run stopped, when there are any.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            ScanError::Cancelled { summary } => Some(summary),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
