//! Deletion tasks and their completion cell.
//!
//! A task is written by exactly one worker and read by exactly one caller.
//! The caller's wait is bounded; a deletion that finishes after the caller
//! gave up still reads as a failure to that caller.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A file the caller wants removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub len: u64,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>, len: u64) -> Self {
        Self { path: path.into(), len }
    }
}

/// Which pool a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Large,
    Small,
}

impl Tier {
    /// Classify a byte length against the throttle threshold.
    pub fn classify(len: u64, throttle_threshold: u64) -> Self {
        if len >= throttle_threshold { Tier::Large } else { Tier::Small }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Large => "large",
            Tier::Small => "small",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One pending deletion.
#[derive(Debug)]
pub struct DeletionTask {
    path: PathBuf,
    len: u64,
    timeout: Duration,
    /// `None` until a worker records the outcome.
    outcome: Mutex<Option<bool>>,
    finished: Condvar,
}

impl DeletionTask {
    pub fn new(file: FileRef, timeout: Duration) -> Self {
        Self {
            path: file.path,
            len: file.len,
            timeout,
            outcome: Mutex::new(None),
            finished: Condvar::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_len(&self) -> u64 {
        self.len
    }

    pub fn is_done(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// Record the deletion outcome and wake the waiting caller.
    pub fn complete(&self, result: bool) {
        let mut outcome = self.outcome.lock();
        if outcome.is_some() {
            log::warn!("Deletion of {} already completed, ignoring second result", self.path.display());
            return;
        }
        *outcome = Some(result);
        self.finished.notify_all();
    }

    /// Block until the task completes or its timeout elapses.
    ///
    /// Wakes at least every `poll_interval` to re-check. Returns `false` on
    /// timeout even if the deletion succeeds later.
    pub fn await_result(&self, poll_interval: Duration) -> bool {
        // None: the timeout is too large to represent, so never give up
        let deadline = Instant::now().checked_add(self.timeout);
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = *outcome {
                return result;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        log::warn!(
                            "Waited more than {}ms for deleting {}, giving up",
                            self.timeout.as_millis(),
                            self.path.display()
                        );
                        return false;
                    }
                    poll_interval.min(deadline - now)
                }
                None => poll_interval,
            };
            self.finished.wait_for(&mut outcome, wait);
        }
    }
}
