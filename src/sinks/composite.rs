//! Fan-out sink forwarding to an ordered list of children

use crate::core::{
    registry::{isolate, log_if_enabled},
    sink::same_sink,
    LogLevel, LogRecord, Result, SharedSink, Sink, SinkLevel,
};
use parking_lot::RwLock;

/// Groups several sinks behind one registration.
///
/// The composite has its own threshold (default `Info`), checked by the
/// engine before the record reaches it; each child then applies its own
/// threshold. A child that fails or panics does not stop delivery to the
/// others, and the first failure is reported once every child has been tried.
///
/// # Example
///
/// ```
/// use rust_log_engine::prelude::*;
/// use std::sync::Arc;
///
/// let composite = CompositeSink::new();
/// composite.add_sink(Arc::new(ConsoleSink::with_colors(false)));
/// assert_eq!(composite.len(), 1);
/// ```
pub struct CompositeSink {
    level: SinkLevel,
    children: RwLock<Vec<SharedSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self {
            level: SinkLevel::default(),
            children: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    pub fn add_sink(&self, sink: SharedSink) {
        self.children.write().push(sink);
    }

    /// Remove the first child identical to `sink`
    pub fn remove_sink(&self, sink: &SharedSink) -> bool {
        let mut children = self.children.write();
        match children.iter().position(|c| same_sink(c, sink)) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear_sinks(&self) {
        self.children.write().clear();
    }

    pub fn sinks(&self) -> Vec<SharedSink> {
        self.children.read().clone()
    }

    pub fn len(&self) -> usize {
        self.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.read().is_empty()
    }
}

impl Default for CompositeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for CompositeSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let mut first_error = None;
        for child in self.children.read().iter() {
            if let Err(e) = log_if_enabled(child.as_ref(), record) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for child in self.children.read().iter() {
            if let Err(e) = isolate(child.as_ref(), "flush", || child.flush()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn level(&self) -> LogLevel {
        self.level.get()
    }

    /// Sets the composite's own threshold and every current child's
    fn set_level(&self, level: LogLevel) {
        self.level.set(level);
        for child in self.children.read().iter() {
            child.set_level(level);
        }
    }

    fn name(&self) -> &str {
        "composite"
    }
}

impl std::fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .children
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        f.debug_struct("CompositeSink")
            .field("level", &self.level.get())
            .field("children", &names)
            .finish()
    }
}
