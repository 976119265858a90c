//! Output helpers for the eolfmt binary
pub mod summary;
pub mod version;
