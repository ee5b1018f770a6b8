//! `AppConfig` struct and TOML read/write.

use std::path::{Path, PathBuf};

use alacarta_api::tv3::CacheConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Response cache configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheSettings {
    /// Whether cacheable responses are stored on disk.
    #[serde(default)]
    pub enabled: bool,
    /// Cache directory. Generated on first use and saved back when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    /// Builds the client cache configuration, applying command-line overrides.
    ///
    /// `no_cache` wins over everything; `cache_dir` enables the cache there.
    #[must_use]
    pub fn resolve(&self, cache_dir: Option<&Path>, no_cache: bool) -> CacheConfig {
        if no_cache {
            return CacheConfig::disabled();
        }
        match (cache_dir, &self.dir) {
            (Some(dir), _) => CacheConfig::in_dir(dir),
            (None, _) if !self.enabled => CacheConfig::disabled(),
            (None, Some(dir)) => CacheConfig::in_dir(dir.as_path()),
            (None, None) => CacheConfig::temporary(),
        }
    }

    /// Records a generated cache directory so later runs reuse it.
    ///
    /// Returns `true` when the settings changed and need saving.
    pub fn remember_dir(&mut self, dir: &Path) -> bool {
        if !self.enabled || self.dir.is_some() {
            return false;
        }
        self.dir = Some(dir.to_path_buf());
        true
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
