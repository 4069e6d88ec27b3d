//! Predicate-gated sink decorator

use crate::core::{LogLevel, LogRecord, Result, SharedSink, Sink};
use parking_lot::RwLock;
use std::sync::Arc;

/// Record predicate used by [`FilterSink`]
pub type RecordFilter = Arc<dyn Fn(&LogRecord) -> bool + Send + Sync>;

/// Forwards a record to its child only when the predicate accepts it.
///
/// Threshold handling belongs to the child: `level`, `set_level` and
/// `should_log` delegate to it, and `flush` always reaches it.
///
/// # Example
///
/// ```
/// use rust_log_engine::prelude::*;
/// use std::sync::Arc;
///
/// let sink = FilterSink::new(Arc::new(ConsoleSink::with_colors(false)), |record| {
///     !record.message().contains("healthcheck")
/// });
/// assert_eq!(sink.name(), "console");
/// ```
pub struct FilterSink {
    child: SharedSink,
    filter: RwLock<RecordFilter>,
}

impl FilterSink {
    pub fn new<F>(child: SharedSink, filter: F) -> Self
    where
        F: Fn(&LogRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            child,
            filter: RwLock::new(Arc::new(filter)),
        }
    }

    /// Replace the predicate; later records are judged by the new one
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&LogRecord) -> bool + Send + Sync + 'static,
    {
        *self.filter.write() = Arc::new(filter);
    }

    pub fn child(&self) -> &SharedSink {
        &self.child
    }
}

impl Sink for FilterSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let filter = Arc::clone(&self.filter.read());
        if filter(record) {
            self.child.log(record)
        } else {
            Ok(())
        }
    }

    fn flush(&self) -> Result<()> {
        self.child.flush()
    }

    fn level(&self) -> LogLevel {
        self.child.level()
    }

    fn set_level(&self, level: LogLevel) {
        self.child.set_level(level)
    }

    fn should_log(&self, level: LogLevel) -> bool {
        self.child.should_log(level)
    }

    fn name(&self) -> &str {
        self.child.name()
    }
}

impl std::fmt::Debug for FilterSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSink")
            .field("child", &self.child.name())
            .finish_non_exhaustive()
    }
}
