//! Basic engine usage example
//!
//! Demonstrates the asynchronous engine with a console sink, per-sink
//! thresholds and the logging macros.
//!
//! Run with: cargo run --example basic_usage

use rust_log_engine::prelude::*;
use rust_log_engine::{debug, error, fatal, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Engine - Basic Usage Example ===\n");

    // Create an engine with a bounded queue and one worker
    let engine = DeliveryEngine::new(EngineConfig::default().with_queue_size(1024))?;

    // Console sink accepting everything
    let console: SharedSink = Arc::new(ConsoleSink::new().with_level(LogLevel::Trace));
    engine.add_sink(console.clone());
    engine.start()?;

    println!("1. Logging at different levels:");
    trace!(engine, "This is a trace message");
    debug!(engine, "This is a debug message");
    info!(engine, "This is an info message");
    warn!(engine, "This is a warning message");
    error!(engine, "This is an error message");
    fatal!(engine, "This is a fatal message");
    engine.wait_for_completion(Duration::from_secs(1));

    println!("\n2. Raising the sink threshold:");
    console.set_level(LogLevel::Info);
    println!("   Threshold set to INFO - trace and debug won't show:");
    trace!(engine, "Trace message (hidden)");
    debug!(engine, "Debug message (hidden)");
    info!(engine, "Info message (visible)");
    warn!(engine, "Warning message (visible)");

    // Deliver everything still queued, then flush
    engine.stop(true);

    println!("\n{}", engine.stats());
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
