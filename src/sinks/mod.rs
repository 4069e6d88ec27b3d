//! Sink implementations

pub mod channel;
pub mod composite;
#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod filter;

pub use channel::ChannelSink;
pub use composite::CompositeSink;
#[cfg(feature = "console")]
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use file::FileSink;
pub use filter::{FilterSink, RecordFilter};

pub use crate::core::{SharedSink, Sink};
