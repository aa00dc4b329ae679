//! Runtime counters and cycle timing.
//!
//! Lightweight instrumentation for drivers and dashboards: lock-free
//! counters incremented on the hot path, plus a small mutex-guarded ring of
//! recent cycle durations read only on export. Nothing here is persisted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

const TIMING_RING_CAPACITY: usize = 256;

/// Atomic counters for high-frequency control-loop events.
#[derive(Debug, Default)]
pub struct CycleCounters {
    /// Cycles completed.
    pub cycles: AtomicU64,
    /// Concepts created.
    pub concepts_created: AtomicU64,
    /// Concepts displaced out of the store.
    pub concepts_forgotten: AtomicU64,
    /// Concepts recovered from the subconscious cache.
    pub concepts_remembered: AtomicU64,
    /// Tasks that entered the system.
    pub tasks_added: AtomicU64,
    /// Tasks removed or neglected.
    pub tasks_removed: AtomicU64,
    /// Premises enqueued for derivation.
    pub premises_enqueued: AtomicU64,
    /// Premises executed.
    pub premises_fired: AtomicU64,
}

impl CycleCounters {
    /// Create zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            concepts_created: AtomicU64::new(0),
            concepts_forgotten: AtomicU64::new(0),
            concepts_remembered: AtomicU64::new(0),
            tasks_added: AtomicU64::new(0),
            tasks_removed: AtomicU64::new(0),
            premises_enqueued: AtomicU64::new(0),
            premises_fired: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            concepts_created: self.concepts_created.load(Ordering::Relaxed),
            concepts_forgotten: self.concepts_forgotten.load(Ordering::Relaxed),
            concepts_remembered: self.concepts_remembered.load(Ordering::Relaxed),
            tasks_added: self.tasks_added.load(Ordering::Relaxed),
            tasks_removed: self.tasks_removed.load(Ordering::Relaxed),
            premises_enqueued: self.premises_enqueued.load(Ordering::Relaxed),
            premises_fired: self.premises_fired.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Cycles completed.
    pub cycles: u64,
    /// Concepts created.
    pub concepts_created: u64,
    /// Concepts displaced out of the store.
    pub concepts_forgotten: u64,
    /// Concepts recovered from the subconscious cache.
    pub concepts_remembered: u64,
    /// Tasks that entered the system.
    pub tasks_added: u64,
    /// Tasks removed or neglected.
    pub tasks_removed: u64,
    /// Premises enqueued for derivation.
    pub premises_enqueued: u64,
    /// Premises executed.
    pub premises_fired: u64,
}

/// Ring of recent cycle durations.
#[derive(Debug, Default)]
pub struct CycleTimings {
    samples: Mutex<VecDeque<Duration>>,
}

impl CycleTimings {
    /// Record one cycle's wall time.
    pub fn record(&self, elapsed: Duration) {
        let mut samples = self.samples.lock();
        if samples.len() == TIMING_RING_CAPACITY {
            samples.pop_front();
        }
        samples.push_back(elapsed);
    }

    /// Mean duration over the retained window, in microseconds.
    #[must_use]
    pub fn mean_us(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        let total: f64 = samples.iter().map(|d| d.as_secs_f64() * 1e6).sum();
        total / samples.len() as f64
    }

    /// Worst duration over the retained window, in microseconds.
    #[must_use]
    pub fn max_us(&self) -> f64 {
        self.samples
            .lock()
            .iter()
            .map(|d| d.as_secs_f64() * 1e6)
            .fold(0.0, f64::max)
    }
}
