//! The two deletion lanes and the steal path between them.
//!
//! Each lane owns its own lock, condition variable and capacity. The large
//! lane is served largest-file-first, the small lane in arrival order.
//! Large workers fall back to the small lane when their own is empty; small
//! workers never touch the large lane.

use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::sync::Arc;

use super::task::{DeletionTask, Tier};

/// Why a task could not be queued. The task is handed back to the caller.
#[derive(Debug)]
pub enum OfferError {
    /// The lane is at capacity.
    Full(Arc<DeletionTask>),
    /// The lane was closed by a reconfiguration or shutdown.
    Closed(Arc<DeletionTask>),
}

impl OfferError {
    pub fn into_task(self) -> Arc<DeletionTask> {
        match self {
            OfferError::Full(task) | OfferError::Closed(task) => task,
        }
    }
}

impl fmt::Display for OfferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferError::Full(task) => write!(f, "queue full, dropping {}", task.path().display()),
            OfferError::Closed(task) => write!(f, "queue closed, dropping {}", task.path().display()),
        }
    }
}

/// A task handed to a worker.
#[derive(Debug)]
pub struct Taken {
    pub task: Arc<DeletionTask>,
    /// True when a large worker pulled this from the small lane.
    pub stolen: bool,
}

/// Point-in-time lane lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSizes {
    pub large: usize,
    pub small: usize,
}

impl QueueSizes {
    pub fn total(&self) -> usize {
        self.large + self.small
    }
}

/// Storage order inside a lane.
trait Backlog: Default {
    fn push_task(&mut self, task: Arc<DeletionTask>);
    fn pop_task(&mut self) -> Option<Arc<DeletionTask>>;
    fn pending(&self) -> usize;
    fn drain_tasks(&mut self) -> Vec<Arc<DeletionTask>>;
}

impl Backlog for VecDeque<Arc<DeletionTask>> {
    fn push_task(&mut self, task: Arc<DeletionTask>) {
        self.push_back(task);
    }

    fn pop_task(&mut self) -> Option<Arc<DeletionTask>> {
        self.pop_front()
    }

    fn pending(&self) -> usize {
        self.len()
    }

    fn drain_tasks(&mut self) -> Vec<Arc<DeletionTask>> {
        self.drain(..).collect()
    }
}

/// Heap entry ordering tasks by file length.
#[derive(Debug)]
struct BySize(Arc<DeletionTask>);

impl PartialEq for BySize {
    fn eq(&self, other: &Self) -> bool {
        self.0.file_len() == other.0.file_len()
    }
}

impl Eq for BySize {}

impl PartialOrd for BySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BySize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.file_len().cmp(&other.0.file_len())
    }
}

impl Backlog for BinaryHeap<BySize> {
    fn push_task(&mut self, task: Arc<DeletionTask>) {
        self.push(BySize(task));
    }

    fn pop_task(&mut self) -> Option<Arc<DeletionTask>> {
        self.pop().map(|entry| entry.0)
    }

    fn pending(&self) -> usize {
        self.len()
    }

    fn drain_tasks(&mut self) -> Vec<Arc<DeletionTask>> {
        // Largest first, so re-dispatch keeps the serving order.
        let mut tasks = Vec::with_capacity(self.len());
        while let Some(entry) = self.pop() {
            tasks.push(entry.0);
        }
        tasks
    }
}

struct LaneState<B> {
    backlog: B,
    closed: bool,
}

struct Lane<B> {
    state: Mutex<LaneState<B>>,
    ready: Condvar,
    capacity: usize,
}

impl<B: Backlog> Lane<B> {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LaneState {
                backlog: B::default(),
                closed: false,
            }),
            ready: Condvar::new(),
            capacity,
        }
    }

    fn offer(&self, task: Arc<DeletionTask>) -> Result<(), OfferError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(OfferError::Closed(task));
        }
        if state.backlog.pending() >= self.capacity {
            return Err(OfferError::Full(task));
        }
        state.backlog.push_task(task);
        self.ready.notify_one();
        Ok(())
    }

    fn try_pop(&self) -> Option<Arc<DeletionTask>> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.backlog.pop_task()
    }

    fn len(&self) -> usize {
        self.state.lock().backlog.pending()
    }

    fn close(&self) -> Vec<Arc<DeletionTask>> {
        let mut state = self.state.lock();
        state.closed = true;
        let drained = state.backlog.drain_tasks();
        self.ready.notify_all();
        drained
    }
}

/// The large/small lane pair shared by the dispatcher and both worker pools.
pub struct TieredQueue {
    large: Lane<BinaryHeap<BySize>>,
    small: Lane<VecDeque<Arc<DeletionTask>>>,
}

impl TieredQueue {
    pub fn new(large_capacity: usize, small_capacity: usize) -> Self {
        Self {
            large: Lane::new(large_capacity),
            small: Lane::new(small_capacity),
        }
    }

    /// Queue a task without blocking.
    pub fn offer(&self, tier: Tier, task: Arc<DeletionTask>) -> Result<(), OfferError> {
        match tier {
            Tier::Large => self.large.offer(task),
            Tier::Small => {
                self.small.offer(task)?;
                // Idle large workers sleep on their own lane; wake one so it can steal.
                // Taking the large lock orders this after any in-progress steal check.
                let _large = self.large.state.lock();
                self.large.ready.notify_one();
                Ok(())
            }
        }
    }

    /// Block until a task is available for a worker of `tier`.
    ///
    /// Returns `None` once the queue is closed.
    pub fn take(&self, tier: Tier) -> Option<Taken> {
        match tier {
            Tier::Small => {
                let mut small = self.small.state.lock();
                loop {
                    if small.closed {
                        return None;
                    }
                    if let Some(task) = small.backlog.pop_task() {
                        return Some(Taken { task, stolen: false });
                    }
                    self.small.ready.wait(&mut small);
                }
            }
            Tier::Large => {
                let mut large = self.large.state.lock();
                loop {
                    if large.closed {
                        return None;
                    }
                    if let Some(task) = large.backlog.pop_task() {
                        return Some(Taken { task, stolen: false });
                    }
                    if let Some(task) = self.small.try_pop() {
                        return Some(Taken { task, stolen: true });
                    }
                    self.large.ready.wait(&mut large);
                }
            }
        }
    }

    pub fn sizes(&self) -> QueueSizes {
        QueueSizes {
            large: self.large.len(),
            small: self.small.len(),
        }
    }

    /// Close both lanes, wake every blocked worker and hand back whatever was
    /// still queued, large lane first.
    pub fn close(&self) -> Vec<Arc<DeletionTask>> {
        let mut leftovers = self.large.close();
        leftovers.extend(self.small.close());
        leftovers
    }
}
