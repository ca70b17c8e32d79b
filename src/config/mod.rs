//! Configuration system for Sweepr.
//!
//! A single YAML document with two sections:
//! 1. `cleaner` - scheduler tunables, hot-swappable through `DeletionScheduler::apply_config`
//! 2. `archive` - where the CLI looks for files to sweep

use eyre::Result;
use std::path::PathBuf;

pub use self::cleaner::{
    CleanerConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_QUEUE_CAPACITY, DEFAULT_TASK_TIMEOUT_MS, DEFAULT_THREAD_COUNT,
    DEFAULT_THROTTLE_THRESHOLD,
};
pub use self::global::{ArchiveConfig, GlobalConfig};

mod cleaner;
mod global;

/// Load configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .sweepr.yml in current directory (project config)
/// 3. ~/.config/sweepr/sweepr.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<GlobalConfig> {
    let config = GlobalConfig::load(explicit_path)?;
    config.validate()?;
    Ok(config)
}
