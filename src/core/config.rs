//! Engine configuration

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;
/// Default number of records drained per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default auto-flush interval
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Options recognised by [`DeliveryEngine`](crate::core::DeliveryEngine).
///
/// # Example
///
/// ```
/// use rust_log_engine::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::default()
///     .with_queue_size(4096)
///     .with_worker_threads(2)
///     .with_flush_interval(Duration::from_millis(250));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Queue capacity; `0` means unbounded
    pub queue_size: usize,

    /// Maximum records a worker drains in one pass
    pub batch_size: usize,

    /// Minimum time between automatic sink flushes
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,

    /// Worker thread count.
    ///
    /// With one worker, sinks observe records in enqueue order. With more,
    /// only the order within each drained batch is preserved; batches taken
    /// by different workers interleave at the sinks.
    pub worker_threads: usize,

    /// Flush sinks from the workers every `flush_interval`
    pub auto_flush: bool,

    /// Accepted for compatibility; has no effect on the engine
    pub memory_pool_size: usize,

    /// Accepted for compatibility; has no effect on the engine
    pub max_memory_pool_blocks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            worker_threads: 1,
            auto_flush: true,
            memory_pool_size: 1024,
            max_memory_pool_blocks: 1000,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(LoggerError::config(
                "EngineConfig",
                "worker_threads must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config(
                "EngineConfig",
                "batch_size must be at least 1",
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config(
                "EngineConfig",
                "flush_interval must be non-zero",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    #[must_use]
    pub fn with_auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }
}
