//! Sink trait for log delivery destinations

use super::{error::Result, log_level::LogLevel, log_record::LogRecord};
use parking_lot::RwLock;
use std::sync::Arc;

/// A delivery backend for records.
///
/// Sinks are shared between the engine's registry and decorators such as
/// [`CompositeSink`](crate::sinks::CompositeSink), so every operation takes
/// `&self`; implementations use interior mutability for their writers and
/// thresholds. Several worker threads may call into one sink concurrently.
///
/// # Example
///
/// ```
/// use rust_log_engine::core::{LogLevel, LogRecord, Result, Sink, SinkLevel};
///
/// struct StderrSink {
///     level: SinkLevel,
/// }
///
/// impl Sink for StderrSink {
///     fn log(&self, record: &LogRecord) -> Result<()> {
///         eprintln!("[{}] {}", record.level(), record.message());
///         Ok(())
///     }
///
///     fn flush(&self) -> Result<()> {
///         Ok(())
///     }
///
///     fn level(&self) -> LogLevel {
///         self.level.get()
///     }
///
///     fn set_level(&self, level: LogLevel) {
///         self.level.set(level)
///     }
///
///     fn name(&self) -> &str {
///         "stderr"
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// Write one record. Called only when [`should_log`](Self::should_log)
    /// accepted the record's level.
    fn log(&self, record: &LogRecord) -> Result<()>;

    /// Make previously written records durable or visible.
    fn flush(&self) -> Result<()>;

    /// Current severity threshold
    fn level(&self) -> LogLevel;

    fn set_level(&self, level: LogLevel);

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    fn name(&self) -> &str;
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn Sink>;

/// Identity comparison of two sink handles, ignoring vtable addresses.
pub(crate) fn same_sink(a: &SharedSink, b: &SharedSink) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Threshold cell for sink implementations
#[derive(Debug)]
pub struct SinkLevel(RwLock<LogLevel>);

impl SinkLevel {
    pub fn new(level: LogLevel) -> Self {
        Self(RwLock::new(level))
    }

    #[inline]
    pub fn get(&self) -> LogLevel {
        *self.0.read()
    }

    pub fn set(&self, level: LogLevel) {
        *self.0.write() = level;
    }
}

impl Default for SinkLevel {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink {
        level: SinkLevel,
    }

    impl Sink for NullSink {
        fn log(&self, _record: &LogRecord) -> Result<()> {
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn level(&self) -> LogLevel {
            self.level.get()
        }

        fn set_level(&self, level: LogLevel) {
            self.level.set(level)
        }

        fn name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_default_should_log() {
        let sink = NullSink { level: SinkLevel::default() };
        assert!(!sink.should_log(LogLevel::Debug));
        assert!(sink.should_log(LogLevel::Info));
        assert!(sink.should_log(LogLevel::Fatal));

        sink.set_level(LogLevel::Off);
        assert!(!sink.should_log(LogLevel::Fatal));
    }

    #[test]
    fn test_same_sink_identity() {
        let a: SharedSink = Arc::new(NullSink { level: SinkLevel::default() });
        let b: SharedSink = Arc::new(NullSink { level: SinkLevel::default() });
        let a2 = Arc::clone(&a);
        assert!(same_sink(&a, &a2));
        assert!(!same_sink(&a, &b));
    }
}
