//! Global configuration.
//!
//! Loaded from ~/.config/sweepr/sweepr.yml or .sweepr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::CleanerConfig;

/// Global configuration for Sweepr.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Deletion scheduler tunables.
    pub cleaner: CleanerConfig,

    /// Where the archive lives and which files to sweep.
    pub archive: ArchiveConfig,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .sweepr.yml in current directory
    /// 3. ~/.config/sweepr/sweepr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".sweepr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .sweepr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .sweepr.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sweepr").join("sweepr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.cleaner.validate()?;
        if self.archive.pattern.is_empty() {
            eyre::bail!("archive.pattern must not be empty");
        }
        glob::Pattern::new(&self.archive.pattern)
            .with_context(|| format!("archive.pattern is not a valid glob: {}", self.archive.pattern))?;
        Ok(())
    }
}

/// Archive location settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root directory holding obsolete files.
    pub dir: PathBuf,

    /// Glob, relative to `dir`, selecting files to sweep.
    pub pattern: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("archive"),
            pattern: "**/*".to_string(),
        }
    }
}
