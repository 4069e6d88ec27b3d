//! Asynchronous delivery engine
//!
//! Producers hand records to [`DeliveryEngine::log`], which never blocks:
//! when the queue is full the record is rejected and counted. A fixed pool
//! of worker threads drains the queue in batches and fans each record out
//! through the [`SinkRegistry`].

use super::{
    config::EngineConfig,
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::EngineMetrics,
    queue::{BoundedQueue, PushError},
    registry::SinkRegistry,
    sink::SharedSink,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest time an idle worker waits before re-checking the stop flag
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Drops between two overflow alerts on stderr
const DROP_ALERT_INTERVAL: u64 = 1000;

/// Callback invoked on the first drop and every 1000th drop thereafter.
/// The argument is the total number of records dropped so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Lifecycle of a [`DeliveryEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, workers not started. Records are accepted and wait in
    /// the queue.
    Idle,
    /// Workers are draining the queue
    Running,
    /// Stop requested; workers are finishing their final drain
    Stopping,
    /// Workers joined. `start` begins a new run with an empty queue.
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stopping => "stopping",
            EngineState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// State shared between the engine handle and its workers
struct Shared {
    /// Queue of the current run. Shutdown is permanent, so each start after
    /// a stop installs a fresh queue.
    queue: RwLock<Arc<BoundedQueue<LogRecord>>>,
    queue_capacity: usize,
    registry: SinkRegistry,
    metrics: EngineMetrics,
    stop_requested: AtomicBool,
    /// Records accepted but not yet fanned out (queued or in a worker batch)
    outstanding: AtomicUsize,
    batch_size: AtomicUsize,
    flush_interval_ms: AtomicU64,
    auto_flush: bool,
    last_flush: Mutex<Instant>,
    on_overflow: RwLock<Option<OverflowCallback>>,
}

impl Shared {
    fn current_queue(&self) -> Arc<BoundedQueue<LogRecord>> {
        Arc::clone(&self.queue.read())
    }

    #[inline]
    fn batch_size(&self) -> usize {
        self.batch_size.load(Ordering::Relaxed)
    }

    fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.load(Ordering::Relaxed))
    }

    /// Fan a drained batch out to the sinks, then drop the records.
    fn deliver(&self, batch: &mut Vec<LogRecord>) {
        let report = self.registry.dispatch_batch(batch);
        self.metrics.record_batch(batch.len());
        self.metrics.record_sink_failures(report.failures);
        self.outstanding.fetch_sub(batch.len(), Ordering::AcqRel);
        batch.clear();
    }

    /// Claim the next auto-flush slot. Only one worker wins per interval.
    fn claim_flush(&self) -> bool {
        let mut last = self.last_flush.lock();
        if last.elapsed() >= self.flush_interval() {
            *last = Instant::now();
            true
        } else {
            false
        }
    }

    fn flush_sinks(&self) -> Result<()> {
        let report = self.registry.flush_all();
        self.metrics.record_flush();
        self.metrics.record_sink_failures(report.failures);
        *self.last_flush.lock() = Instant::now();
        report.into_result()
    }

    fn alert_dropped(&self, previous: u64) {
        if previous != 0 && (previous + 1) % DROP_ALERT_INTERVAL != 0 {
            return;
        }
        eprintln!(
            "[LOGGER WARNING] Queue full, {} records dropped. \
             Consider increasing queue_size or worker_threads.",
            previous + 1
        );
        if let Some(ref callback) = *self.on_overflow.read() {
            callback(previous + 1);
        }
    }
}

/// Whole milliseconds, never less than one
fn interval_millis(interval: Duration) -> u64 {
    (interval.as_millis() as u64).max(1)
}

fn run_worker(shared: Arc<Shared>, queue: Arc<BoundedQueue<LogRecord>>) {
    let mut batch = Vec::with_capacity(shared.batch_size());

    while !shared.stop_requested.load(Ordering::Acquire) {
        let drained = queue.pop_batch_timeout(&mut batch, shared.batch_size(), IDLE_POLL_INTERVAL);
        if drained > 0 {
            shared.deliver(&mut batch);
        }

        if shared.auto_flush && shared.claim_flush() {
            // Failures were already reported and counted by the registry
            let _ = shared.flush_sinks();
        }
    }

    // Deliver whatever was accepted before the stop
    while queue.try_pop_batch(&mut batch, shared.batch_size()) > 0 {
        shared.deliver(&mut batch);
    }
}

struct Lifecycle {
    state: EngineState,
    workers: Vec<JoinHandle<()>>,
}

/// Owner of the record queue, the worker pool and the sink registry.
///
/// The engine is an ordinary value: create it, share it (`&DeliveryEngine`
/// or `Arc<DeliveryEngine>`) with producer threads, and stop or drop it to
/// tear down. Independent engines do not interact.
///
/// # Example
///
/// ```
/// use rust_log_engine::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(1024)).unwrap();
/// engine.add_sink(Arc::new(ConsoleSink::with_colors(false)));
/// engine.start().unwrap();
///
/// engine.log(LogRecord::new(LogLevel::Info, "service ready")).unwrap();
///
/// engine.wait_for_completion(Duration::from_secs(1));
/// engine.stop(true);
/// ```
pub struct DeliveryEngine {
    shared: Arc<Shared>,
    worker_threads: usize,
    lifecycle: Mutex<Lifecycle>,
}

impl DeliveryEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(&config))
    }

    /// Engine with [`EngineConfig::default`]
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::from_valid_config(&EngineConfig::default())
    }

    fn from_valid_config(config: &EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: RwLock::new(Arc::new(BoundedQueue::new(config.queue_size))),
            queue_capacity: config.queue_size,
            registry: SinkRegistry::new(),
            metrics: EngineMetrics::new(),
            stop_requested: AtomicBool::new(false),
            outstanding: AtomicUsize::new(0),
            batch_size: AtomicUsize::new(config.batch_size),
            flush_interval_ms: AtomicU64::new(interval_millis(config.flush_interval)),
            auto_flush: config.auto_flush,
            last_flush: Mutex::new(Instant::now()),
            on_overflow: RwLock::new(None),
        });

        Self {
            shared,
            worker_threads: config.worker_threads,
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::Idle,
                workers: Vec::new(),
            }),
        }
    }

    /// Spawn the worker pool.
    ///
    /// A no-op when already running. After a stop, the previous workers are
    /// joined first and the new run gets an empty queue; records rejected
    /// while stopped are not recovered.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            EngineState::Running => return Ok(()),
            EngineState::Idle => {}
            EngineState::Stopping | EngineState::Stopped => {
                Self::join_workers(&mut lifecycle.workers);
                *self.shared.queue.write() = Arc::new(BoundedQueue::new(self.shared.queue_capacity));
                self.shared.stop_requested.store(false, Ordering::Release);
            }
        }

        *self.shared.last_flush.lock() = Instant::now();

        for idx in 0..self.worker_threads {
            let shared = Arc::clone(&self.shared);
            let queue = self.shared.current_queue();
            let spawned = thread::Builder::new()
                .name(format!("log-worker-{}", idx))
                .spawn(move || run_worker(shared, queue));

            match spawned {
                Ok(handle) => lifecycle.workers.push(handle),
                Err(e) => {
                    // Tear down the workers that did start; they drain the queue on exit
                    self.request_stop();
                    Self::join_workers(&mut lifecycle.workers);
                    lifecycle.state = EngineState::Stopped;
                    return Err(LoggerError::io_operation(
                        "spawning log worker",
                        format!("worker {} of {}", idx + 1, self.worker_threads),
                        e,
                    ));
                }
            }
        }

        lifecycle.state = EngineState::Running;
        Ok(())
    }

    /// Shut the queue before raising the flag: once a worker sees the flag,
    /// no producer can still get a record in behind its final drain.
    fn request_stop(&self) {
        self.shared.queue.read().shutdown();
        self.shared.stop_requested.store(true, Ordering::Release);
    }

    fn join_workers(workers: &mut Vec<JoinHandle<()>>) {
        for handle in workers.drain(..) {
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] Log worker thread panicked during shutdown: {:?}", e);
            }
        }
    }

    /// Request a stop.
    ///
    /// New records are rejected from this point on. Workers deliver every
    /// record that was already accepted before they exit.
    ///
    /// With `wait_for_completion`, the call joins the workers, flushes the
    /// sinks and leaves the engine [`Stopped`](EngineState::Stopped). Without
    /// it, the call returns immediately and the workers finish on their
    /// own; they hold everything they need, so this is safe. A later
    /// `stop(true)` or dropping the engine joins them.
    ///
    /// Calling `stop` on an engine that was never started does nothing.
    pub fn stop(&self, wait_for_completion: bool) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            EngineState::Idle | EngineState::Stopped => return,
            EngineState::Running => {
                self.request_stop();
                lifecycle.state = EngineState::Stopping;
            }
            EngineState::Stopping => {}
        }

        if !wait_for_completion {
            return;
        }

        Self::join_workers(&mut lifecycle.workers);
        lifecycle.state = EngineState::Stopped;
        drop(lifecycle);

        if let Err(e) = self.shared.flush_sinks() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }
    }

    /// Enqueue a record without blocking.
    ///
    /// Returns [`LoggerError::QueueFull`] (and counts a drop) when the
    /// queue is at capacity, or [`LoggerError::EngineStopped`] after a
    /// stop. Records logged before [`start`](Self::start) wait in the queue.
    pub fn log(&self, record: LogRecord) -> Result<()> {
        // Count first so a worker can never observe the record before it is outstanding
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        let queue = self.shared.queue.read();
        match queue.try_push(record) {
            Ok(()) => {
                self.shared.metrics.record_enqueued();
                Ok(())
            }
            Err(err) => {
                self.shared.outstanding.fetch_sub(1, Ordering::AcqRel);
                match err {
                    PushError::Full(_) => {
                        let (current, max) = (queue.len(), queue.capacity());
                        drop(queue);
                        let previous = self.shared.metrics.record_dropped();
                        self.shared.alert_dropped(previous);
                        Err(LoggerError::queue_full(current, max))
                    }
                    PushError::Shutdown(_) => Err(LoggerError::EngineStopped),
                }
            }
        }
    }

    /// Flush every sink now. Does not drain the queue.
    ///
    /// Every sink is flushed even if an earlier one fails; the first
    /// failure is returned.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush_sinks()
    }

    /// Poll until every accepted record has been handed to the sinks, the
    /// engine is no longer running, or `timeout` elapses.
    ///
    /// Returns `false` on timeout. Best effort only.
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.is_running() && self.shared.outstanding.load(Ordering::Acquire) > 0 {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
        true
    }

    pub fn add_sink(&self, sink: SharedSink) {
        self.shared.registry.add(sink);
    }

    pub fn remove_sink(&self, sink: &SharedSink) -> bool {
        self.shared.registry.remove(sink)
    }

    pub fn clear_sinks(&self) {
        self.shared.registry.clear();
    }

    pub fn sink_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Set the threshold of every registered sink
    pub fn set_level(&self, level: LogLevel) {
        self.shared.registry.set_level(level);
    }

    /// Threshold of the first sink, `Info` without sinks
    pub fn level(&self) -> LogLevel {
        self.shared.registry.level()
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    pub fn set_overflow_callback(&self, callback: OverflowCallback) {
        *self.shared.on_overflow.write() = Some(callback);
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    pub fn worker_thread_count(&self) -> usize {
        self.worker_threads
    }

    pub fn queue_size(&self) -> usize {
        self.shared.queue.read().len()
    }

    /// Queue capacity, `0` when unbounded
    pub fn queue_capacity(&self) -> usize {
        self.shared.queue_capacity
    }

    pub fn dropped_count(&self) -> u64 {
        self.shared.metrics.dropped_count()
    }

    /// `dropped / (dropped + queued)`, or `0.0` when both are zero
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = dropped + self.queue_size() as f64;
        if total == 0.0 {
            0.0
        } else {
            dropped / total
        }
    }

    pub fn batch_size(&self) -> usize {
        self.shared.batch_size()
    }

    /// Takes effect on the workers' next drain. `0` is treated as `1`.
    pub fn set_batch_size(&self, batch_size: usize) {
        self.shared.batch_size.store(batch_size.max(1), Ordering::Relaxed);
    }

    pub fn flush_interval(&self) -> Duration {
        self.shared.flush_interval()
    }

    /// Sub-millisecond intervals are rounded up to one millisecond.
    pub fn set_flush_interval(&self, interval: Duration) {
        self.shared
            .flush_interval_ms
            .store(interval_millis(interval), Ordering::Relaxed);
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.shared.metrics
    }

    /// Point-in-time view of the engine counters
    pub fn stats(&self) -> EngineStats {
        let metrics = &self.shared.metrics;
        EngineStats {
            state: self.state(),
            worker_threads: self.worker_threads,
            queue_size: self.queue_size(),
            queue_capacity: self.queue_capacity(),
            batch_size: self.batch_size(),
            flush_interval: self.flush_interval(),
            enqueued: metrics.enqueued_count(),
            dropped: metrics.dropped_count(),
            dispatched: metrics.dispatched_count(),
            batches: metrics.batch_count(),
            sink_failures: metrics.sink_failure_count(),
            flushes: metrics.flush_count(),
            drop_rate: self.drop_rate(),
        }
    }

    pub fn reset_stats(&self) {
        self.shared.metrics.reset();
    }
}

impl Default for DeliveryEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("state", &self.state())
            .field("worker_threads", &self.worker_threads)
            .field("queue", &*self.shared.queue.read())
            .field("registry", &self.shared.registry)
            .finish()
    }
}

impl Drop for DeliveryEngine {
    fn drop(&mut self) {
        if self.state() == EngineState::Idle {
            let pending = self.queue_size();
            if pending > 0 {
                eprintln!(
                    "[LOGGER WARNING] Log engine dropped before start; {} queued records discarded",
                    pending
                );
            }
        }

        self.stop(true);

        let dropped = self.shared.metrics.dropped_count();
        if dropped > 0 {
            let attempted = dropped + self.shared.metrics.enqueued_count();
            eprintln!(
                "[LOGGER WARNING] Log engine shutting down with {} dropped records ({:.2}% of {} attempted)",
                dropped,
                dropped as f64 / attempted as f64 * 100.0,
                attempted
            );
        }
    }
}

/// Snapshot returned by [`DeliveryEngine::stats`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub state: EngineState,
    pub worker_threads: usize,
    pub queue_size: usize,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enqueued: u64,
    pub dropped: u64,
    pub dispatched: u64,
    pub batches: u64,
    pub sink_failures: u64,
    pub flushes: u64,
    pub drop_rate: f64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capacity = if self.queue_capacity == 0 {
            "unbounded".to_string()
        } else {
            self.queue_capacity.to_string()
        };
        writeln!(f, "Log engine ({}, {} workers)", self.state, self.worker_threads)?;
        writeln!(f, "  queue: {}/{}", self.queue_size, capacity)?;
        writeln!(
            f,
            "  batch size: {}, flush interval: {:?}",
            self.batch_size, self.flush_interval
        )?;
        writeln!(
            f,
            "  enqueued: {}, dispatched: {} in {} batches",
            self.enqueued, self.dispatched, self.batches
        )?;
        writeln!(
            f,
            "  dropped: {} (drop rate {:.2}%)",
            self.dropped,
            self.drop_rate * 100.0
        )?;
        write!(
            f,
            "  sink failures: {}, flushes: {}",
            self.sink_failures, self.flushes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::{Sink, SinkLevel};

    #[derive(Default)]
    struct CountingSink {
        level: SinkLevel,
        logged: AtomicUsize,
        flushed: AtomicUsize,
    }

    impl Sink for CountingSink {
        fn log(&self, _record: &LogRecord) -> Result<()> {
            self.logged.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.flushed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn level(&self) -> LogLevel {
            self.level.get()
        }

        fn set_level(&self, level: LogLevel) {
            self.level.set(level)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn record(i: usize) -> LogRecord {
        LogRecord::new(LogLevel::Info, format!("record {}", i))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = DeliveryEngine::new(EngineConfig::default().with_worker_threads(0));
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_defaults_match_config() {
        let engine = DeliveryEngine::default();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.queue_capacity(), EngineConfig::default().queue_size);
        assert_eq!(engine.batch_size(), EngineConfig::default().batch_size);
        assert_eq!(engine.worker_thread_count(), 1);
    }

    #[test]
    fn test_drop_accounting() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(2)).unwrap();
        assert!(engine.log(record(0)).is_ok());
        assert!(engine.log(record(1)).is_ok());

        let err = engine.log(record(2)).unwrap_err();
        assert!(err.is_queue_full());
        assert_eq!(engine.dropped_count(), 1);
        assert_eq!(engine.queue_size(), 2);
    }

    #[test]
    fn test_drop_rate_formula() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(3)).unwrap();
        assert_eq!(engine.drop_rate(), 0.0);

        for i in 0..5 {
            let _ = engine.log(record(i));
        }
        assert_eq!(engine.queue_size(), 3);
        assert_eq!(engine.dropped_count(), 2);
        assert!((engine.drop_rate() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_worker_threads(2)).unwrap();
        engine.stop(true);
        assert_eq!(engine.state(), EngineState::Idle);

        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());

        engine.stop(true);
        engine.stop(true);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(8)).unwrap();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());

        engine.start().unwrap();
        engine.log(record(0)).unwrap();
        engine.stop(false);
        assert!(engine.log(record(1)).is_err());

        engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.queue_capacity(), 8);
        engine.log(record(2)).unwrap();
        engine.stop(true);

        assert_eq!(sink.logged.load(Ordering::SeqCst), 2);
        assert_eq!(engine.dropped_count(), 0);
    }

    #[test]
    fn test_log_after_stop_fails_without_counting() {
        let engine = DeliveryEngine::default();
        engine.start().unwrap();
        engine.stop(true);

        assert!(matches!(engine.log(record(0)), Err(LoggerError::EngineStopped)));
        assert_eq!(engine.dropped_count(), 0);
    }

    #[test]
    fn test_no_loss_on_graceful_stop() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_batch_size(7)).unwrap();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());

        for i in 0..500 {
            engine.log(record(i)).unwrap();
        }
        engine.start().unwrap();
        engine.stop(true);

        assert_eq!(sink.logged.load(Ordering::SeqCst), 500);
        assert_eq!(engine.metrics().dispatched_count(), 500);
        assert_eq!(engine.queue_size(), 0);
    }

    #[test]
    fn test_detached_stop_then_join() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_worker_threads(3)).unwrap();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());

        for i in 0..300 {
            engine.log(record(i)).unwrap();
        }
        engine.start().unwrap();
        engine.stop(false);
        assert_eq!(engine.state(), EngineState::Stopping);
        assert!(engine.log(record(999)).is_err());

        engine.stop(true);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(sink.logged.load(Ordering::SeqCst), 300);
    }

    #[test]
    fn test_flush_records_metrics() {
        let engine = DeliveryEngine::default();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());

        engine.flush().unwrap();
        assert_eq!(sink.flushed.load(Ordering::SeqCst), 1);
        assert_eq!(engine.metrics().flush_count(), 1);
    }

    #[test]
    fn test_auto_flush_runs_on_workers() {
        let config = EngineConfig::default()
            .with_flush_interval(Duration::from_millis(5))
            .with_auto_flush(true);
        let engine = DeliveryEngine::new(config).unwrap();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());
        engine.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.flushed.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        engine.stop(true);
        assert!(sink.flushed.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_auto_flush_disabled() {
        let config = EngineConfig::default()
            .with_flush_interval(Duration::from_millis(1))
            .with_auto_flush(false);
        let engine = DeliveryEngine::new(config).unwrap();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());
        engine.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sink.flushed.load(Ordering::SeqCst), 0);
        engine.stop(true);
    }

    #[test]
    fn test_wait_for_completion() {
        let engine = DeliveryEngine::default();
        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());
        engine.start().unwrap();

        for i in 0..1000 {
            engine.log(record(i)).unwrap();
        }
        assert!(engine.wait_for_completion(Duration::from_secs(10)));
        assert_eq!(sink.logged.load(Ordering::SeqCst), 1000);
        engine.stop(true);
    }

    #[test]
    fn test_wait_for_completion_returns_when_not_running() {
        let engine = DeliveryEngine::default();
        engine.log(record(0)).unwrap();
        // Not running, so there is nothing to wait for
        assert!(engine.wait_for_completion(Duration::from_millis(10)));
    }

    #[test]
    fn test_overflow_callback_invoked_on_first_drop() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(1)).unwrap();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        engine.set_overflow_callback(Arc::new(move |total: u64| {
            seen_clone.store(total, Ordering::SeqCst);
        }));

        engine.log(record(0)).unwrap();
        assert!(engine.log(record(1)).is_err());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_runtime_tuning() {
        let engine = DeliveryEngine::default();
        engine.set_batch_size(0);
        assert_eq!(engine.batch_size(), 1);
        engine.set_flush_interval(Duration::from_micros(10));
        assert_eq!(engine.flush_interval(), Duration::from_millis(1));
        engine.set_flush_interval(Duration::from_millis(250));
        assert_eq!(engine.flush_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_sub_millisecond_config_interval_rounds_up() {
        let config = EngineConfig::default().with_flush_interval(Duration::from_micros(500));
        let engine = DeliveryEngine::new(config).unwrap();
        assert_eq!(engine.flush_interval(), Duration::from_millis(1));
        assert_eq!(engine.stats().flush_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_threshold_panic_does_not_kill_worker() {
        struct BadThreshold;

        impl Sink for BadThreshold {
            fn log(&self, _record: &LogRecord) -> Result<()> {
                Ok(())
            }

            fn flush(&self) -> Result<()> {
                Ok(())
            }

            fn level(&self) -> LogLevel {
                panic!("threshold unavailable")
            }

            fn set_level(&self, _level: LogLevel) {}

            fn name(&self) -> &str {
                "bad-threshold"
            }
        }

        let engine = DeliveryEngine::default();
        let good = Arc::new(CountingSink::default());
        engine.add_sink(Arc::new(BadThreshold));
        engine.add_sink(good.clone());
        engine.start().unwrap();

        for i in 0..10 {
            engine.log(record(i)).unwrap();
        }
        assert!(engine.wait_for_completion(Duration::from_secs(10)));
        assert_eq!(good.logged.load(Ordering::SeqCst), 10);
        assert_eq!(engine.metrics().sink_failure_count(), 10);
        assert_eq!(engine.queue_size(), 0);
        engine.stop(true);
    }

    #[test]
    fn test_level_delegates_to_sinks() {
        let engine = DeliveryEngine::default();
        assert_eq!(engine.level(), LogLevel::Info);

        let sink = Arc::new(CountingSink::default());
        engine.add_sink(sink.clone());
        engine.set_level(LogLevel::Error);
        assert_eq!(sink.level(), LogLevel::Error);
        assert!(!engine.should_log(LogLevel::Warn));
        assert!(engine.should_log(LogLevel::Fatal));
    }

    #[test]
    fn test_stats_snapshot() {
        let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(1)).unwrap();
        engine.log(record(0)).unwrap();
        let _ = engine.log(record(1));

        let stats = engine.stats();
        assert_eq!(stats.state, EngineState::Idle);
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.queue_size, 1);
        let text = stats.to_string();
        assert!(text.contains("queue: 1/1"));
        assert!(text.contains("dropped: 1 (drop rate 50.00%)"));

        engine.reset_stats();
        assert_eq!(engine.stats().dropped, 0);
    }
}
