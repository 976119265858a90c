use eolfmt_core::RunSummary;

pub const TOOL_NAME: &str = "eolfmt";

/// `eolfmt: 3 files processed, 1 modified[, 2 errors]`, prefixed with
/// `interrupted - ` when the run was cancelled.
pub fn render(summary: &RunSummary) -> String {
    let mut line = format!("{TOOL_NAME}: ");
    if summary.interrupted {
        line.push_str("interrupted - ");
    }
    line.push_str(&format!(
        "{} files processed, {} modified",
        summary.processed, summary.modified
    ));
    if summary.errors > 0 {
        line.push_str(&format!(", {} errors", summary.errors));
    }
    line
}

pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
