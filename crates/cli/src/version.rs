use crate::summary::TOOL_NAME;

/// Build metadata injected through environment variables at compile time.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("EOLFMT_COMMIT").unwrap_or("none"),
            date: option_env!("EOLFMT_BUILD_DATE").unwrap_or("unknown"),
            rustc: option_env!("EOLFMT_RUSTC").unwrap_or("unknown"),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{TOOL_NAME} version {}\n  commit: {}\n  built at: {}\n  rustc: {}",
            self.version, self.commit, self.date, self.rustc
        )
    }
}
