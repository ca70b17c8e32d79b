//! Error types for Sweepr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Sweepr
#[derive(Debug, Error)]
pub enum SweeprError {
    /// Rejected cleaner configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A deletion worker thread could not be started
    #[error("Failed to spawn worker {name}: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation on a scheduler that has been shut down
    #[error("Scheduler is shut down")]
    ShutDown,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Glob pattern error
    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result type alias for Sweepr operations
pub type Result<T> = std::result::Result<T, SweeprError>;
