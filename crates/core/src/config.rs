use crate::error::ConfigError;
use crate::walker::DEFAULT_CHANNEL_CAPACITY;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;

pub const DEFAULT_SAMPLE_SIZE: usize = 512;

/// Fields that `EOLFMT_*` variables supply as comma-separated lists.
const LIST_KEYS: &[&str] = &[
    "exclude_dirs",
    "exclude_globs",
    "skip_extensions",
    "text_extensions",
];

const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    ".idea",
    "target",
    "build",
    "dist",
    "vendor",
    "__pycache__",
];

const DEFAULT_SKIP_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "png", "jpg", "jpeg", "gif", "pdf", "zip", "tar", "gz", "pyc",
    "class", "jar",
];

const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "go", "js", "py", "java", "c", "h", "sh", "yml", "json", "xml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub exclude_dirs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub skip_extensions: Vec<String>,
    pub text_extensions: Vec<String>,
    /// `None` or `0` means one worker per available processing unit.
    pub parallelism: Option<usize>,
    pub channel_capacity: usize,
    pub sample_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: to_strings(DEFAULT_EXCLUDE_DIRS),
            exclude_globs: Vec::new(),
            skip_extensions: to_strings(DEFAULT_SKIP_EXTENSIONS),
            text_extensions: to_strings(DEFAULT_TEXT_EXTENSIONS),
            parallelism: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ScanConfig {
    /// Normalizes extensions to lowercase without a leading dot and checks the
    /// remaining invariants.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "channel_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.sample_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sample_size",
                reason: "must be at least 1".into(),
            });
        }

        self.skip_extensions = normalize_extensions(&self.skip_extensions);
        self.text_extensions = normalize_extensions(&self.text_extensions);
        let skip: HashSet<&str> = self.skip_extensions.iter().map(String::as_str).collect();
        if let Some(ext) = self
            .text_extensions
            .iter()
            .find(|ext| skip.contains(ext.as_str()))
        {
            return Err(ConfigError::OverlappingExtension { ext: ext.clone() });
        }

        // Surface bad patterns here rather than when the walk starts.
        build_globset(&self.exclude_globs)?;
        Ok(self)
    }

    pub fn effective_parallelism(&self) -> usize {
        match self.parallelism {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }

    pub fn extension_table(&self) -> ExtensionTable {
        ExtensionTable {
            skip: self.skip_extensions.iter().cloned().collect(),
            text: self.text_extensions.iter().cloned().collect(),
        }
    }

    pub fn exclusions(&self) -> Result<Exclusions, ConfigError> {
        Ok(Exclusions {
            dir_names: self.exclude_dirs.iter().cloned().collect(),
            globs: build_globset(&self.exclude_globs)?,
        })
    }
}

/// Lowercase extension lookups. Extensions in neither set need sniffing.
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    skip: HashSet<String>,
    text: HashSet<String>,
}

impl ExtensionTable {
    pub fn is_skipped(&self, ext: &str) -> bool {
        self.skip.contains(ext)
    }

    pub fn is_text(&self, ext: &str) -> bool {
        self.text.contains(ext)
    }
}

/// Directory names pruned by name at any depth, plus optional path globs.
#[derive(Debug, Clone)]
pub struct Exclusions {
    dir_names: HashSet<String>,
    globs: GlobSet,
}

impl Exclusions {
    pub fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.dir_names.contains(name)
    }

    pub fn matches_glob(&self, path: &std::path::Path) -> bool {
        !self.globs.is_empty() && self.globs.is_match(path)
    }
}

pub fn load(path: Option<&str>) -> Result<ScanConfig, ConfigError> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("eolfmt").required(false));
    }
    let mut env = config::Environment::with_prefix("EOLFMT")
        .try_parsing(true)
        .list_separator(",");
    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    settings = settings.add_source(env);
    let cfg = settings.build()?;
    let scan: ScanConfig = cfg.try_deserialize()?;
    scan.validate()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ScanConfig::default().validate().unwrap();
        let table = cfg.extension_table();
        assert!(table.is_skipped("png"));
        assert!(table.is_text("md"));
        assert!(!table.is_text("rs"));
        assert_eq!(cfg.channel_capacity, 1000);
        assert_eq!(cfg.sample_size, 512);
        assert!(cfg.effective_parallelism() >= 1);
    }

    #[test]
    fn extensions_are_normalized() {
        let cfg = ScanConfig {
            skip_extensions: vec![".PNG".into(), " Bin ".into()],
            text_extensions: vec![".Rs".into()],
            ..ScanConfig::default()
        }
        .validate()
        .unwrap();
        assert_eq!(cfg.skip_extensions, vec!["png", "bin"]);
        assert_eq!(cfg.text_extensions, vec!["rs"]);
    }

    #[test]
    fn overlapping_extension_sets_are_rejected() {
        let err = ScanConfig {
            skip_extensions: vec!["txt".into()],
            text_extensions: vec![".TXT".into()],
            ..ScanConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingExtension { ext } if ext == "txt"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ScanConfig {
            channel_capacity: 0,
            ..ScanConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "channel_capacity",
                ..
            }
        ));
    }

    #[test]
    fn bad_glob_is_rejected() {
        let err = ScanConfig {
            exclude_globs: vec!["a[".into()],
            ..ScanConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob(_)));
    }

    #[test]
    fn explicit_parallelism_wins() {
        let cfg = ScanConfig {
            parallelism: Some(3),
            ..ScanConfig::default()
        };
        assert_eq!(cfg.effective_parallelism(), 3);
    }

    #[test]
    fn load_reads_explicit_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("eolfmt.toml");
        std::fs::write(
            &path,
            "exclude_dirs = [\"out\"]\nparallelism = 2\nchannel_capacity = 16\n",
        )
        .unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.exclude_dirs, vec!["out"]);
        assert_eq!(cfg.parallelism, Some(2));
        assert_eq!(cfg.channel_capacity, 16);
        assert_eq!(cfg.sample_size, 512);
    }

    #[test]
    fn env_lists_are_split_on_commas() {
        std::env::set_var("EOLFMT_EXCLUDE_GLOBS", "**/gen,*.log");
        std::env::set_var("EOLFMT_TEXT_EXTENSIONS", "rs,.TOML");
        let loaded = load(None);
        std::env::remove_var("EOLFMT_EXCLUDE_GLOBS");
        std::env::remove_var("EOLFMT_TEXT_EXTENSIONS");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.exclude_globs, vec!["**/gen", "*.log"]);
        assert_eq!(cfg.text_extensions, vec!["rs", "toml"]);
        assert_eq!(cfg.exclude_dirs, ScanConfig::default().exclude_dirs);
    }
}
