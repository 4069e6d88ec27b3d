//! Core engine types and traits

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod sink;

pub use config::{EngineConfig, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_SIZE};
pub use engine::{DeliveryEngine, EngineState, EngineStats, OverflowCallback, IDLE_POLL_INTERVAL};
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, OutputFormat, StandardFormatter, TimestampFormat};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use metrics::EngineMetrics;
pub use queue::{BoundedQueue, PushError};
pub use registry::{DispatchReport, SinkRegistry};
pub use sink::{SharedSink, Sink, SinkLevel};
