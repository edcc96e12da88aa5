//! Basic pipeline usage example
//!
//! Demonstrates prioritized asynchronous logging with a console sink.
//!
//! Run with: cargo run --example basic_usage

use log_pipeline::prelude::*;
use log_pipeline::{fatal, info, warning};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Pipeline - Basic Usage Example ===\n");

    // Producers submit into the pipeline; the sink polls its output queue.
    let pipeline = Arc::new(LogPipeline::new());
    let sink = ConsoleSink::builder(Arc::clone(&pipeline)).build();

    println!("1. Logging at different severities:");
    pipeline.verbose("Demo", "This is a verbose message");
    pipeline.debug("Demo", "This is a debug message");
    pipeline.info("Demo", "This is an info message");
    pipeline.warning("Demo", "This is a warning message");
    pipeline.error("Demo", "This is an error message");
    pipeline.fatal("Demo", "This is a fatal message");

    // Let the drain worker move the batch, then render it.
    thread::sleep(Duration::from_millis(50));
    sink.update()?;

    println!("\n2. Severity-prioritized delivery:");
    println!("   Submitted low-to-high; rendered high-to-low:");
    pipeline.verbose("Priority", "submitted first");
    pipeline.info("Priority", "submitted second");
    pipeline.fatal("Priority", "submitted last, rendered first");
    pipeline.drain_now();
    sink.update()?;

    println!("\n3. The logging macros:");
    info!(pipeline, "Macros", "Answer computed: {}", 42);
    warning!(pipeline, "Macros", "Retrying ({} of {})", 1, 3);
    fatal!(pipeline, "Macros", "Unrecoverable: {}", "demo over");
    pipeline.drain_now();
    sink.update()?;

    let metrics = pipeline.metrics();
    println!(
        "\n4. Metrics: {} submitted, {} delivered",
        metrics.submitted_count(),
        metrics.popped_count()
    );

    sink.dispose();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
