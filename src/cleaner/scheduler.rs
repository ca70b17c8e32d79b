//! The deletion scheduler: dispatch, batch wait, reconfiguration.
//!
//! A *generation* is one queue pair plus the two pools serving it.
//! Reconfiguration replaces the generation wholesale and moves every task
//! that was still queued into the new one.

use parking_lot::RwLock;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::counters::DeletionCounters;
use super::pool::{PoolContext, WorkerPool};
use super::queue::{OfferError, QueueSizes, TieredQueue};
use super::task::{DeletionTask, FileRef, Tier};
use crate::config::CleanerConfig;
use crate::deleter::FileDeleter;
use crate::error::{Result, SweeprError};

/// What a reconfiguration did with the tasks it found queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconfigReport {
    /// Tasks still queued when the old generation was retired.
    pub leftovers: usize,
    pub redispatched_large: usize,
    pub redispatched_small: usize,
    /// Leftovers that no longer fit the new capacities; completed as failed.
    pub dropped: usize,
}

struct Generation {
    number: u64,
    config: CleanerConfig,
    queue: Arc<TieredQueue>,
    large: WorkerPool,
    small: WorkerPool,
}

impl Generation {
    fn start(
        number: u64,
        config: CleanerConfig,
        deleter: &Arc<dyn FileDeleter>,
        counters: &Arc<DeletionCounters>,
    ) -> Result<Self> {
        let queue = Arc::new(TieredQueue::new(config.large_queue_capacity, config.small_queue_capacity));
        let ctx = PoolContext {
            queue: queue.clone(),
            deleter: deleter.clone(),
            counters: counters.clone(),
            throttle_threshold: config.throttle_threshold,
            generation: number,
        };

        let large = match WorkerPool::start(Tier::Large, config.large_thread_count, &ctx) {
            Ok(pool) => pool,
            Err(e) => {
                queue.close();
                return Err(e);
            }
        };
        let small = match WorkerPool::start(Tier::Small, config.small_thread_count, &ctx) {
            Ok(pool) => pool,
            Err(e) => {
                large.stop();
                queue.close();
                return Err(e);
            }
        };

        Ok(Self {
            number,
            config,
            queue,
            large,
            small,
        })
    }

    /// Classify by size and queue without blocking.
    fn dispatch(&self, task: Arc<DeletionTask>) -> std::result::Result<Tier, OfferError> {
        let tier = Tier::classify(task.file_len(), self.config.throttle_threshold);
        self.queue.offer(tier, task)?;
        Ok(tier)
    }

    /// Stop both pools and close the queue, returning the never-dequeued tasks.
    fn retire(&self) -> Vec<Arc<DeletionTask>> {
        self.large.stop();
        self.small.stop();
        self.queue.close()
    }
}

/// Background batch deletion scheduler with large/small worker tiers.
pub struct DeletionScheduler {
    deleter: Arc<dyn FileDeleter>,
    counters: Arc<DeletionCounters>,
    current: RwLock<Generation>,
    shut_down: AtomicBool,
}

impl DeletionScheduler {
    /// Validate `config` and start both worker pools.
    pub fn new(config: CleanerConfig, deleter: Arc<dyn FileDeleter>) -> Result<Self> {
        config.validate()?;
        let counters = Arc::new(DeletionCounters::new());
        let generation = Generation::start(0, config, &deleter, &counters)?;

        Ok(Self {
            deleter,
            counters,
            current: RwLock::new(generation),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Queue every file for deletion and wait for each accepted one.
    ///
    /// Files that do not fit in their lane are skipped for this round. Returns
    /// the number of files confirmed deleted within their timeout.
    pub fn submit_batch<I>(&self, files: I) -> usize
    where
        I: IntoIterator<Item = FileRef>,
    {
        let (accepted, poll_interval) = {
            let current = self.current.read();
            let timeout = current.config.task_timeout();
            let mut accepted = Vec::new();
            for file in files {
                let task = Arc::new(DeletionTask::new(file, timeout));
                match current.dispatch(task.clone()) {
                    Ok(_) => accepted.push(task),
                    Err(e) => log::trace!("{}", e),
                }
            }
            (accepted, current.config.poll_interval())
        };

        accepted.iter().filter(|task| task.await_result(poll_interval)).count()
    }

    /// Swap in a new configuration, restarting the worker pools if anything
    /// changed.
    ///
    /// Returns `Ok(None)` when `config` matches the current one. Tasks a worker
    /// already picked up finish on that worker; everything still queued moves
    /// to the new generation.
    pub fn apply_config(&self, config: CleanerConfig) -> Result<Option<ReconfigReport>> {
        config.validate()?;
        if self.is_shut_down() {
            return Err(SweeprError::ShutDown);
        }

        let mut current = self.current.write();
        if !current.config.log_changes(&config) {
            log::debug!("Update configuration triggered but nothing changed for this cleaner");
            return Ok(None);
        }

        let next = Generation::start(current.number + 1, config, &self.deleter, &self.counters)?;
        let old = mem::replace(&mut *current, next);
        let leftovers = old.retire();

        let mut report = ReconfigReport {
            leftovers: leftovers.len(),
            ..Default::default()
        };
        for task in leftovers {
            match current.dispatch(task) {
                Ok(Tier::Large) => report.redispatched_large += 1,
                Ok(Tier::Small) => report.redispatched_small += 1,
                Err(e) => {
                    log::warn!("Leftover task not re-queued: {}", e);
                    e.into_task().complete(false);
                    report.dropped += 1;
                }
            }
        }

        log::info!(
            "Restarted file cleaner generation {}: {} leftover tasks ({} large, {} small, {} dropped)",
            current.number,
            report.leftovers,
            report.redispatched_large,
            report.redispatched_small,
            report.dropped
        );
        Ok(Some(report))
    }

    /// Stop both pools, fail every queued task and wait for the workers to exit.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut current = self.current.write();
        let leftovers = current.retire();
        if !leftovers.is_empty() {
            log::debug!("Failing {} queued deletions on shutdown", leftovers.len());
        }
        for task in leftovers {
            task.complete(false);
        }
        current.large.join();
        current.small.join();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn deleted_large_files(&self) -> u64 {
        self.counters.large()
    }

    pub fn deleted_small_files(&self) -> u64 {
        self.counters.small()
    }

    pub fn queue_sizes(&self) -> QueueSizes {
        self.current.read().queue.sizes()
    }

    pub fn config(&self) -> CleanerConfig {
        self.current.read().config.clone()
    }

    /// Live worker threads across both tiers of the current generation.
    pub fn worker_count(&self) -> usize {
        let current = self.current.read();
        current.large.worker_count() + current.small.worker_count()
    }
}

impl Drop for DeletionScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    fn always_ok() -> Arc<dyn FileDeleter> {
        Arc::new(|_: &Path| -> io::Result<bool> { Ok(true) })
    }

    fn fast_config() -> CleanerConfig {
        CleanerConfig::default()
            .with_throttle_threshold(65536)
            .with_timeouts(Duration::from_secs(5), Duration::from_millis(10))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = fast_config().with_thread_counts(1, 0);
        assert!(matches!(
            DeletionScheduler::new(config, always_ok()),
            Err(SweeprError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_submit_empty_batch() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        assert_eq!(scheduler.submit_batch(Vec::new()), 0);
    }

    #[test]
    fn test_submit_counts_by_size() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        let files = vec![
            FileRef::new("a", 1000),
            FileRef::new("b", 70000),
            FileRef::new("c", 5000),
        ];

        assert_eq!(scheduler.submit_batch(files), 3);
        assert_eq!(scheduler.queue_sizes().total(), 0);

        // Workers count after completing; joining them settles the counters
        scheduler.shutdown();
        assert_eq!(scheduler.deleted_large_files(), 1);
        assert_eq!(scheduler.deleted_small_files(), 2);
    }

    #[test]
    fn test_failed_deletes_not_counted() {
        let deleter: Arc<dyn FileDeleter> = Arc::new(|path: &Path| -> io::Result<bool> {
            if path.ends_with("missing") {
                Ok(false)
            } else {
                Err(io::Error::other("disk on fire"))
            }
        });
        let scheduler = DeletionScheduler::new(fast_config(), deleter).unwrap();

        let files = vec![FileRef::new("missing", 10), FileRef::new("broken", 100_000)];
        assert_eq!(scheduler.submit_batch(files), 0);
        scheduler.shutdown();
        assert_eq!(scheduler.deleted_large_files(), 0);
        assert_eq!(scheduler.deleted_small_files(), 0);
    }

    #[test]
    fn test_apply_identical_config_is_noop() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        assert_eq!(scheduler.apply_config(fast_config()).unwrap(), None);
        assert_eq!(scheduler.worker_count(), 2);
    }

    #[test]
    fn test_apply_invalid_config_keeps_current() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        let bad = fast_config().with_queue_capacities(0, 10);

        assert!(scheduler.apply_config(bad).is_err());
        assert_eq!(scheduler.config(), fast_config());
    }

    #[test]
    fn test_apply_config_restarts_pools() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        let next = fast_config().with_thread_counts(3, 2).with_throttle_threshold(100);

        let report = scheduler.apply_config(next.clone()).unwrap().unwrap();
        assert_eq!(report, ReconfigReport::default());
        assert_eq!(scheduler.worker_count(), 5);
        assert_eq!(scheduler.config(), next);

        // New threshold applies to new submissions
        assert_eq!(scheduler.submit_batch(vec![FileRef::new("a", 150)]), 1);
        scheduler.shutdown();
        assert_eq!(scheduler.deleted_large_files(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        scheduler.shutdown();
        scheduler.shutdown();
        assert!(scheduler.is_shut_down());
        assert!(matches!(
            scheduler.apply_config(fast_config().with_throttle_threshold(1)),
            Err(SweeprError::ShutDown)
        ));
    }

    #[test]
    fn test_submit_after_shutdown_drops_everything() {
        let scheduler = DeletionScheduler::new(fast_config(), always_ok()).unwrap();
        scheduler.shutdown();
        assert_eq!(scheduler.submit_batch(vec![FileRef::new("a", 10)]), 0);
    }
}
