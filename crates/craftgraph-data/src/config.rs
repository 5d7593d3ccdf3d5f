//! Build settings, loadable from TOML. Every field has a default.

use crate::fetch::DEFAULT_MANIFEST_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Per-version outputs go to `<output_root>/<version>/`.
    pub output_root: PathBuf,
    /// Downloaded server archives are cached here.
    pub cache_dir: PathBuf,
    pub manifest_url: String,
    pub user_agent: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("assets/gamegraph"),
            cache_dir: PathBuf::from("assets/cache"),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            user_agent: concat!("craftgraph/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl BuildConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.output_root.join(version)
    }
}
