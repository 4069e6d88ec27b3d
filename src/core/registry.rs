//! Ordered, level-filtered sink fan-out

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    sink::{same_sink, SharedSink, Sink},
};
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of one fan-out or flush pass
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of successful sink calls
    pub delivered: usize,
    /// Number of sink calls that returned an error or panicked
    pub failures: usize,
    /// The first failure of the pass, if any
    pub first_error: Option<LoggerError>,
}

impl DispatchReport {
    fn record(&mut self, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.delivered += 1,
            Err(e) => {
                self.failures += 1;
                if self.first_error.is_none() {
                    self.first_error = Some(e);
                }
            }
        }
    }

    /// `Ok` when every sink call succeeded, otherwise the first failure
    pub fn into_result(self) -> Result<()> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run one sink operation, converting errors and panics into a reported
/// failure so the caller can move on to the next sink.
pub(crate) fn isolate<T>(
    sink: &dyn Sink,
    operation: &str,
    call: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            eprintln!(
                "[LOGGER ERROR] Sink '{}' failed during {}: {}",
                sink.name(),
                operation,
                e
            );
            Err(LoggerError::sink_failure(sink.name(), e.to_string()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            eprintln!(
                "[LOGGER CRITICAL] Sink '{}' panicked during {}: {}. \
                 Other sinks continue to function.",
                sink.name(),
                operation,
                message
            );
            Err(LoggerError::sink_panicked(sink.name(), message))
        }
    }
}

/// Threshold check and write, both under isolation. `Ok(false)` means the
/// sink's threshold skipped the record.
pub(crate) fn log_if_enabled(sink: &dyn Sink, record: &LogRecord) -> Result<bool> {
    isolate(sink, "log", || {
        if sink.should_log(record.level()) {
            sink.log(record).map(|()| true)
        } else {
            Ok(false)
        }
    })
}

/// Thread-safe ordered collection of sinks.
///
/// A record reaches sink `S` iff `S.should_log(record.level())`. The list
/// lock is held for a whole dispatch pass, so `add`/`remove` never
/// interleave with the delivery of a batch.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<Vec<SharedSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: SharedSink) {
        self.sinks.write().push(sink);
    }

    /// Remove the first registration of `sink` (by identity).
    /// Returns whether a sink was removed.
    pub fn remove(&self, sink: &SharedSink) -> bool {
        let mut sinks = self.sinks.write();
        match sinks.iter().position(|s| same_sink(s, sink)) {
            Some(idx) => {
                sinks.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.sinks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Snapshot of the registered sinks in insertion order
    pub fn sinks(&self) -> Vec<SharedSink> {
        self.sinks.read().clone()
    }

    fn fan_out(sinks: &[SharedSink], record: &LogRecord, report: &mut DispatchReport) {
        for sink in sinks {
            match log_if_enabled(sink.as_ref(), record) {
                Ok(false) => {}
                Ok(true) => report.record(Ok(())),
                Err(e) => report.record(Err(e)),
            }
        }
    }

    /// Deliver one record to every sink whose threshold accepts it.
    pub fn dispatch(&self, record: &LogRecord) -> DispatchReport {
        let sinks = self.sinks.read();
        let mut report = DispatchReport::default();
        Self::fan_out(&sinks, record, &mut report);
        report
    }

    /// Deliver a batch in order under one acquisition of the sink list.
    pub fn dispatch_batch(&self, records: &[LogRecord]) -> DispatchReport {
        let sinks = self.sinks.read();
        let mut report = DispatchReport::default();
        for record in records {
            Self::fan_out(&sinks, record, &mut report);
        }
        report
    }

    /// Flush every sink in order, regardless of level.
    pub fn flush_all(&self) -> DispatchReport {
        let sinks = self.sinks.read();
        let mut report = DispatchReport::default();
        for sink in sinks.iter() {
            report.record(isolate(sink.as_ref(), "flush", || sink.flush()));
        }
        report
    }

    /// Apply `level` to every currently registered sink.
    pub fn set_level(&self, level: LogLevel) {
        for sink in self.sinks.read().iter() {
            sink.set_level(level);
        }
    }

    /// Threshold of the first registered sink, `Info` when empty.
    pub fn level(&self) -> LogLevel {
        self.sinks
            .read()
            .first()
            .map(|s| s.level())
            .unwrap_or(LogLevel::Info)
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.sinks.read().iter().map(|s| s.name().to_string()).collect();
        f.debug_struct("SinkRegistry").field("sinks", &names).finish()
    }
}
