//! Deleted-file counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::task::Tier;

/// Per-tier counts of confirmed deletions.
///
/// Each count wraps to zero instead of overflowing.
#[derive(Debug, Default)]
pub struct DeletionCounters {
    large: AtomicU64,
    small: AtomicU64,
}

impl DeletionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tier: Tier) {
        let counter = match tier {
            Tier::Large => &self.large,
            Tier::Small => &self.small,
        };
        // fetch_add wraps on overflow
        let previous = counter.fetch_add(1, Ordering::Relaxed);
        if previous == u64::MAX {
            log::info!("Deleted more than u64::MAX {} files, reset counter to 0", tier);
        }
    }

    pub fn large(&self) -> u64 {
        self.large.load(Ordering::Relaxed)
    }

    pub fn small(&self) -> u64 {
        self.small.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn preset(large: u64, small: u64) -> Self {
        Self {
            large: AtomicU64::new(large),
            small: AtomicU64::new(small),
        }
    }
}
