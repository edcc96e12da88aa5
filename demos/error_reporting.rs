//! Exception reporting example
//!
//! Demonstrates decomposing a nested error chain into a block of fatal
//! messages, plus hand-built reports with attached context.
//!
//! Run with: cargo run --example error_reporting

use log_pipeline::prelude::*;
use std::fmt;
use std::io;
use std::sync::Arc;

#[derive(Debug)]
struct ConfigError {
    path: String,
    source: io::Error,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not load configuration from '{}'", self.path)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn load_config() -> std::result::Result<(), ConfigError> {
    Err(ConfigError {
        path: "/etc/demo/app.toml".into(),
        source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
    })
}

fn main() -> Result<()> {
    println!("=== Log Pipeline - Error Reporting Example ===\n");

    let pipeline = Arc::new(LogPipeline::new());
    let sink = ConsoleSink::builder(Arc::clone(&pipeline)).build();

    println!("1. A nested error becomes one contiguous fatal block:");
    if let Err(err) = load_config() {
        pipeline.exception("Startup", &err);
    }
    pipeline.drain_now();
    sink.update()?;

    println!("\n2. Hand-built reports carry extra context:");
    let report = ErrorReport::new("demo::ReplicationLag", "replica fell behind")
        .with_data("replica", "db-replica-2")
        .with_data("lag_seconds", "47")
        .with_trace("demo::monitor::check_lag\ndemo::monitor::run");
    pipeline.exception_report("Replication", &report);
    pipeline.drain_now();
    sink.update()?;

    println!("\n3. Deep cause chains are truncated at {} levels.", MAX_CAUSE_DEPTH);

    sink.dispose();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
