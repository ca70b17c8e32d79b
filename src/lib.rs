//! Sweepr - tiered batch deletion for archived storage files
//!
//! Callers hand Sweepr a batch of files; each one is routed to a large-file
//! or small-file worker pool by size, deleted in the background, and the
//! caller gets back how many deletions were confirmed in time.

pub mod archive;
pub mod cleaner;
pub mod config;
pub mod deleter;
pub mod error;

pub use error::{Result, SweeprError};
