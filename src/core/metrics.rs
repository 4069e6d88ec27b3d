//! Engine metrics for observability
//!
//! Counters for monitoring engine health: drops under overload, records
//! delivered, sink failures and flush activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the [`DeliveryEngine`](crate::core::DeliveryEngine)
///
/// # Example
///
/// ```
/// use rust_log_engine::EngineMetrics;
///
/// let metrics = EngineMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_enqueued();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.enqueued_count(), 1);
/// ```
#[derive(Debug)]
pub struct EngineMetrics {
    /// Records rejected because the queue was full
    dropped: AtomicU64,

    /// Records accepted into the queue
    enqueued: AtomicU64,

    /// Records taken off the queue and fanned out
    dispatched: AtomicU64,

    /// Non-empty batches processed by workers
    batches: AtomicU64,

    /// Sink calls that returned an error or panicked
    sink_failures: AtomicU64,

    /// Flush passes over the sink registry
    flushes: AtomicU64,
}

impl EngineMetrics {
    pub const fn new() -> Self {
        Self {
            dropped: AtomicU64::new(0),
            enqueued: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failure_count(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Record a dropped record, returning the previous drop count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record one processed batch of `records` records
    #[inline]
    pub fn record_batch(&self, records: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.dispatched.fetch_add(records as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sink_failures(&self, failures: usize) {
        if failures > 0 {
            self.sink_failures.fetch_add(failures as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.dropped.store(0, Ordering::Relaxed);
        self.enqueued.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EngineMetrics {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            dropped: AtomicU64::new(self.dropped_count()),
            enqueued: AtomicU64::new(self.enqueued_count()),
            dispatched: AtomicU64::new(self.dispatched_count()),
            batches: AtomicU64::new(self.batch_count()),
            sink_failures: AtomicU64::new(self.sink_failure_count()),
            flushes: AtomicU64::new(self.flush_count()),
        }
    }
}
