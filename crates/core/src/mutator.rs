//! Appends the missing trailing newline without touching existing content.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Opens `path` append-only and writes a single `\n`. Existing bytes are never
/// read or rewritten and mode bits are left alone.
pub fn append_newline(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(b"\n")?;
    file.flush()
}

/// Boolean form of [`append_newline`]: `true` when the byte was written.
pub fn try_append_newline(path: &Path) -> bool {
    append_newline(path).is_ok()
}
