//! File logging example
//!
//! Demonstrates delivering to a console sink and a JSON file sink at the
//! same time.
//!
//! Run with: cargo run --example file_logging

use rust_log_engine::prelude::*;
use rust_log_engine::{debug, error, info, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Engine - File Logging Example ===\n");

    let engine = DeliveryEngine::new(
        EngineConfig::default()
            .with_worker_threads(2)
            .with_batch_size(32),
    )?;

    // Console shows INFO and above; the file keeps everything as JSON lines
    engine.add_sink(Arc::new(ConsoleSink::new()));
    engine.add_sink(Arc::new(
        FileSink::new("application.log")?
            .with_output_format(OutputFormat::Json)
            .with_level(LogLevel::Trace),
    ));
    engine.start()?;

    println!("1. Logging to both console and file:");
    info!(engine, "Application started");
    debug!(engine, "Loading configuration...");
    info!(engine, "Configuration loaded successfully");
    warn!(engine, "Using default settings for some options");
    error!(engine, "Failed to load optional plugin");

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        info!(engine, "Processing item {}/5", i);
        if i == 3 {
            warn!(engine, "Item 3 took longer than expected");
        }
    }
    info!(engine, "All operations completed");

    // Joins the workers and flushes both sinks
    engine.stop(true);

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the full log output");

    Ok(())
}
