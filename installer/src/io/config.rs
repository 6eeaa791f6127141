//! Optional installer settings stored in a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Installer settings (TOML).
///
/// Every field has a default, so an absent file and an empty file behave the
/// same.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallerConfig {
    /// `bundle install --jobs` value used when the Gemfile.lock pins cocoapods.
    pub bundle_install_jobs: u32,

    /// `bundle install --retry` value.
    pub bundle_install_retry: u32,

    /// Post a CI annotation when the Podfile still uses the git Specs repo.
    pub annotate_specs_repo: bool,

    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Register `Pods -> Podfile.lock` as a cache include path.
    pub enabled: bool,

    /// Environment variable holding the newline separated include paths.
    pub env_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            env_key: "BITRISE_CACHE_INCLUDE_PATHS".to_string(),
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            bundle_install_jobs: 20,
            bundle_install_retry: 5,
            annotate_specs_repo: true,
            cache: CacheConfig::default(),
        }
    }
}

impl InstallerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bundle_install_jobs == 0 {
            return Err(anyhow!("bundle_install_jobs must be > 0"));
        }
        if self.cache.enabled && self.cache.env_key.trim().is_empty() {
            return Err(anyhow!("cache.env_key must be non-empty when cache is enabled"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `InstallerConfig::default()`.
pub fn load_config(path: &Path) -> Result<InstallerConfig> {
    if !path.exists() {
        let cfg = InstallerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: InstallerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
