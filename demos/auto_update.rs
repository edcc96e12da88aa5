//! Auto-updating console sink example
//!
//! Demonstrates background rendering with multi-threaded producers, dynamic
//! header padding, and console signal handling.
//!
//! Run with: cargo run --example auto_update

use log_pipeline::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Pipeline - Auto Update Example ===\n");

    let signals = Arc::new(SignalRegistry::new());
    let pipeline = Arc::new(
        LogPipeline::builder()
            .signals(Arc::clone(&signals))
            .build(),
    );
    let sink = ConsoleSink::builder(Arc::clone(&pipeline))
        .dynamic_padding(true)
        .auto_update(true)
        .signals(Arc::clone(&signals))
        .build();

    println!("1. Multi-threaded producers, rendered in the background:");

    let mut handles = vec![];
    for thread_id in 0..3 {
        let pipeline = Arc::clone(&pipeline);
        let handle = thread::spawn(move || {
            for i in 0..10 {
                pipeline.info("Worker", format!("Thread {} - Message {}", thread_id, i));
                thread::sleep(Duration::from_millis(5));
            }
        });
        handles.push(handle);
    }
    for handle in handles {
        handle.join().unwrap();
    }
    println!("   3 threads logged 10 messages each");

    // Let the sink worker catch up before the next section prints.
    thread::sleep(Duration::from_millis(100));

    println!("\n2. Dynamic padding aligns message text across tags:");
    pipeline.info("Db", "short tag");
    pipeline.warning("AuthenticationService", "long tag widens the column");
    pipeline.error("Db", "short tag again, now padded");
    thread::sleep(Duration::from_millis(100));

    println!("\n3. Console signals walk registered handlers, newest first:");
    let handled = signals.raise(ConsoleSignal::Interrupt);
    println!("   Interrupt handled: {}", handled);
    let handled = signals.raise(ConsoleSignal::SystemShutdown);
    println!("   SystemShutdown handled: {}", handled);
    thread::sleep(Duration::from_millis(100));

    // Disposal stops the sink worker, shuts the pipeline down and renders
    // whatever was still queued.
    sink.dispose();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
