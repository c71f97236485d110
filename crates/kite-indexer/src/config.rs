//! Repository configuration loaded from an optional `kite.toml`
//!
//! ```toml
//! queries-dir = "tools/queries"
//! exclude = ["generated/", "*.min.js"]
//! high-dependents-threshold = 5
//! high-dependencies-threshold = 10
//! ```

use std::path::{Path, PathBuf};

use kite_core::{KiteError, ReportThresholds, Result};
use serde::Deserialize;

/// Config file looked up at the repository root.
pub const CONFIG_FILE: &str = "kite.toml";

/// Query definitions shipped with this crate.
pub fn default_queries_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/queries"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct KiteConfig {
    /// Directory holding `<language>/tags.scm`.
    pub queries_dir: PathBuf,
    /// Extra gitignore-style patterns applied after `.gitignore`.
    pub exclude: Vec<String>,
    pub thresholds: ReportThresholds,
}

impl Default for KiteConfig {
    fn default() -> Self {
        KiteConfig {
            queries_dir: default_queries_dir(),
            exclude: Vec::new(),
            thresholds: ReportThresholds::default(),
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    queries_dir: Option<PathBuf>,
    exclude: Option<Vec<String>>,
    high_dependents_threshold: Option<usize>,
    high_dependencies_threshold: Option<usize>,
}

impl KiteConfig {
    /// Load `kite.toml` from `root`, falling back to defaults when it does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| KiteError::io(&path, e))?;
        let config = Self::parse(&text, root).map_err(|message| KiteError::Config {
            path: path.clone(),
            message,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(text: &str, root: &Path) -> std::result::Result<Self, String> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| e.to_string())?;
        let defaults = Self::default();

        let queries_dir = match raw.queries_dir {
            Some(dir) if dir.is_relative() => root.join(dir),
            Some(dir) => dir,
            None => defaults.queries_dir,
        };

        Ok(KiteConfig {
            queries_dir,
            exclude: raw.exclude.unwrap_or_default(),
            thresholds: ReportThresholds {
                max_dependents: raw
                    .high_dependents_threshold
                    .unwrap_or(defaults.thresholds.max_dependents),
                max_dependencies: raw
                    .high_dependencies_threshold
                    .unwrap_or(defaults.thresholds.max_dependencies),
            },
        })
    }
}
