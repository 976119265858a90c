//! Core library: walking, classification, newline repair and the worker pool.

pub mod buffer_pool;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod mutator;
pub mod pipeline;
pub mod walker;

pub use config::ScanConfig;
pub use error::{ClassifyError, ConfigError, Result, ScanError};
pub use models::{FileOutcome, FileTask, RunCounters, RunSummary, SkipReason};
pub use pipeline::Orchestrator;
