//! # Rust Log Engine
//!
//! An asynchronous log delivery engine: producers enqueue records without
//! blocking, a pool of worker threads drains them in batches and fans each
//! record out to a set of level-filtered sinks.
//!
//! ## Features
//!
//! - **Non-blocking producers**: a full queue drops the newest record and counts it
//! - **Batched delivery**: workers drain up to `batch_size` records per lock
//! - **Failure isolation**: a sink that errors or panics never stops the others
//! - **Composable sinks**: console, file, channel, composite and filter sinks
//!
//! ## Example
//!
//! ```
//! use rust_log_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = DeliveryEngine::new(EngineConfig::default().with_worker_threads(2))?;
//! engine.add_sink(Arc::new(ConsoleSink::with_colors(false)));
//! engine.start()?;
//!
//! engine.log(LogRecord::new(LogLevel::Info, "service ready"))?;
//!
//! engine.stop(true);
//! # Ok::<(), rust_log_engine::LoggerError>(())
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    pub use crate::sinks::{ChannelSink, CompositeSink, FilterSink};
    pub use crate::core::{
        DeliveryEngine, EngineConfig, EngineMetrics, EngineState, EngineStats, Formatter,
        LogLevel, LogRecord, LoggerError, OutputFormat, OverflowCallback, Result, SharedSink,
        Sink, SinkLevel, StandardFormatter, TimestampFormat,
    };
}

#[cfg(feature = "console")]
pub use crate::sinks::ConsoleSink;
#[cfg(feature = "file")]
pub use crate::sinks::FileSink;
pub use crate::sinks::{ChannelSink, CompositeSink, FilterSink, RecordFilter};
pub use crate::core::{
    BoundedQueue, DeliveryEngine, DispatchReport, EngineConfig, EngineMetrics, EngineState,
    EngineStats, Formatter, LogLevel, LogRecord, LoggerError, OutputFormat, OverflowCallback,
    PushError, Result, SharedSink, Sink, SinkLevel, SinkRegistry, StandardFormatter,
    TimestampFormat,
};
