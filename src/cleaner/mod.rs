//! Tiered batch deletion of archived files.
//!
//! This module provides:
//! - **Tasks**: one file plus a bounded-wait completion cell.
//! - **Tiered queue**: a largest-first lane and a FIFO lane; large workers
//!   steal from the small lane when idle, never the other way round.
//! - **Worker pools**: long-lived threads per tier running take -> delete -> complete.
//! - **DeletionScheduler**: dispatches batches, waits on them, and swaps
//!   configuration without losing queued work.
//!
//! # Architecture
//!
//! 1. `submit_batch` classifies each file by the throttle threshold
//! 2. Tasks are offered to the matching lane; a full lane drops the file for this round
//! 3. Workers delete through the `FileDeleter` and complete the task
//! 4. The caller collects results in submission order, each bounded by the task timeout
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sweepr::cleaner::{DeletionScheduler, FileRef};
//! use sweepr::config::CleanerConfig;
//! use sweepr::deleter::LocalFsDeleter;
//!
//! let scheduler = DeletionScheduler::new(CleanerConfig::default(), Arc::new(LocalFsDeleter::new()))?;
//! let deleted = scheduler.submit_batch(vec![FileRef::new("/archive/old.hfile", 4096)]);
//! println!("deleted {deleted} files");
//! # Ok::<(), sweepr::SweeprError>(())
//! ```

mod counters;
mod pool;
mod queue;
mod scheduler;
mod task;

pub use counters::DeletionCounters;
pub use pool::{PoolContext, WorkerPool};
pub use queue::{OfferError, QueueSizes, Taken, TieredQueue};
pub use scheduler::{DeletionScheduler, ReconfigReport};
pub use task::{DeletionTask, FileRef, Tier};
