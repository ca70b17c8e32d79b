//! Deletion worker pools.
//!
//! Each tier runs a fixed number of named OS threads looping
//! take -> delete -> complete until their pool is stopped. Stopping is
//! cooperative: the running flag is checked between tasks, and a worker
//! blocked in `take` only wakes when its queue is closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::counters::DeletionCounters;
use super::queue::{Taken, TieredQueue};
use super::task::Tier;
use crate::deleter::FileDeleter;
use crate::error::{Result, SweeprError};

/// Everything a worker needs, shared by both pools of one generation.
#[derive(Clone)]
pub struct PoolContext {
    pub queue: Arc<TieredQueue>,
    pub deleter: Arc<dyn FileDeleter>,
    pub counters: Arc<DeletionCounters>,
    /// Size class used when counting a successful deletion.
    pub throttle_threshold: u64,
    /// Bumped on every restart; only used in thread names.
    pub generation: u64,
}

/// The threads serving one tier.
pub struct WorkerPool {
    tier: Tier,
    running: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers for `tier`.
    ///
    /// On a spawn failure the already-started workers are told to stop; the
    /// caller must close the queue to release them.
    pub fn start(tier: Tier, count: usize, ctx: &PoolContext) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let name = format!("sweepr-{}-{}.{}", tier, ctx.generation, index);
            let worker_ctx = ctx.clone();
            let worker_running = running.clone();

            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || consumer_loop(tier, worker_ctx, worker_running));

            match spawned {
                Ok(handle) => {
                    log::debug!("Starting file cleaner for {} files: {}", tier, name);
                    workers.push(handle);
                }
                Err(source) => {
                    running.store(false, Ordering::Release);
                    return Err(SweeprError::WorkerSpawn { name, source });
                }
            }
        }

        Ok(Self { tier, running, workers })
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every worker to exit after its current task.
    pub fn stop(&self) {
        log::debug!("Stopping {} file delete threads", self.tier);
        self.running.store(false, Ordering::Release);
    }

    /// Wait for every worker thread to exit.
    pub fn join(&mut self) {
        for worker in self.workers.drain(..) {
            let name = worker.thread().name().unwrap_or("unnamed").to_string();
            if worker.join().is_err() {
                log::warn!("Worker {} panicked", name);
            }
        }
    }
}

fn consumer_loop(tier: Tier, ctx: PoolContext, running: Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        let Some(Taken { task, stolen }) = ctx.queue.take(tier) else {
            log::debug!("Deletion queue closed");
            break;
        };

        log::debug!("Removing: {} from archive", task.path().display());
        let deleted = match ctx.deleter.delete(task.path()) {
            Ok(deleted) => deleted,
            Err(e) => {
                log::warn!("Failed to delete file {}: {}", task.path().display(), e);
                false
            }
        };
        task.complete(deleted);

        if deleted {
            if stolen {
                log::trace!("Stole a small file deletion task in large file thread");
            }
            ctx.counters.record(Tier::classify(task.file_len(), ctx.throttle_threshold));
        }
    }

    log::debug!("Exit thread: {}", thread::current().name().unwrap_or("unnamed"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::task::{DeletionTask, FileRef};
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    fn context(queue: Arc<TieredQueue>, deleter: Arc<dyn FileDeleter>) -> PoolContext {
        PoolContext {
            queue,
            deleter,
            counters: Arc::new(DeletionCounters::new()),
            throttle_threshold: 1000,
            generation: 0,
        }
    }

    fn task(name: &str, len: u64) -> Arc<DeletionTask> {
        Arc::new(DeletionTask::new(FileRef::new(name, len), Duration::from_secs(5)))
    }

    #[test]
    fn test_workers_delete_and_count() {
        let queue = Arc::new(TieredQueue::new(16, 16));
        let ctx = context(queue.clone(), Arc::new(|_: &Path| -> io::Result<bool> { Ok(true) }));
        let mut large = WorkerPool::start(Tier::Large, 2, &ctx).unwrap();
        let mut small = WorkerPool::start(Tier::Small, 1, &ctx).unwrap();
        assert_eq!(large.worker_count(), 2);
        assert_eq!(small.tier(), Tier::Small);

        let big = task("big", 5000);
        let little = task("little", 10);
        queue.offer(Tier::Large, big.clone()).unwrap();
        queue.offer(Tier::Small, little.clone()).unwrap();

        let poll = Duration::from_millis(10);
        assert!(big.await_result(poll));
        assert!(little.await_result(poll));

        large.stop();
        small.stop();
        queue.close();
        large.join();
        small.join();
        assert!(!large.is_running());

        // Counting happens after completion, so only read once workers exited
        assert_eq!(ctx.counters.large(), 1);
        assert_eq!(ctx.counters.small(), 1);
    }

    #[test]
    fn test_io_error_marks_task_failed() {
        let queue = Arc::new(TieredQueue::new(4, 4));
        let deleter = |path: &Path| -> io::Result<bool> {
            if path.ends_with("bad") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(true)
            }
        };
        let ctx = context(queue.clone(), Arc::new(deleter));
        let mut pool = WorkerPool::start(Tier::Small, 1, &ctx).unwrap();

        let bad = task("bad", 10);
        let good = task("good", 10);
        queue.offer(Tier::Small, bad.clone()).unwrap();
        queue.offer(Tier::Small, good.clone()).unwrap();

        let poll = Duration::from_millis(10);
        assert!(!bad.await_result(poll));
        assert!(good.await_result(poll));

        pool.stop();
        queue.close();
        pool.join();
        assert_eq!(ctx.counters.small(), 1);
    }

    #[test]
    fn test_stolen_small_file_counts_as_small() {
        let queue = Arc::new(TieredQueue::new(4, 4));
        let ctx = context(queue.clone(), Arc::new(|_: &Path| -> io::Result<bool> { Ok(true) }));
        let mut pool = WorkerPool::start(Tier::Large, 1, &ctx).unwrap();

        let little = task("little", 10);
        queue.offer(Tier::Small, little.clone()).unwrap();

        assert!(little.await_result(Duration::from_millis(10)));

        pool.stop();
        queue.close();
        pool.join();
        assert_eq!(ctx.counters.small(), 1);
        assert_eq!(ctx.counters.large(), 0);
    }

    #[test]
    fn test_close_releases_idle_workers() {
        let queue = Arc::new(TieredQueue::new(4, 4));
        let ctx = context(queue.clone(), Arc::new(|_: &Path| -> io::Result<bool> { Ok(true) }));
        let mut pool = WorkerPool::start(Tier::Large, 3, &ctx).unwrap();

        pool.stop();
        queue.close();
        pool.join();
        assert_eq!(pool.worker_count(), 0);
    }
}
