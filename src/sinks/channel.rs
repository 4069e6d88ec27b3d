//! Sink that hands formatted lines to a crossbeam channel

use crate::core::{
    Formatter, LogLevel, LogRecord, LoggerError, Result, Sink, SinkLevel, StandardFormatter,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Sends each accepted record, formatted, to a channel.
///
/// Useful for tests and for forwarding to another subsystem. A full bounded
/// channel rejects the line with `QueueFull`; a dropped receiver yields
/// `ChannelSendError`.
pub struct ChannelSink {
    sender: Sender<String>,
    level: SinkLevel,
    formatter: Box<dyn Formatter>,
}

impl ChannelSink {
    pub fn new(sender: Sender<String>) -> Self {
        Self {
            sender,
            level: SinkLevel::default(),
            formatter: Box::new(StandardFormatter::default()),
        }
    }

    /// Sink paired with the receiving end of a fresh unbounded channel
    pub fn unbounded() -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }
}

impl Sink for ChannelSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        match self.sender.try_send(self.formatter.format(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let max = self.sender.capacity().unwrap_or(0);
                Err(LoggerError::queue_full(self.sender.len(), max))
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
        }
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
        "channel"
    }
}
