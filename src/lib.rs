//! # Log Pipeline
//!
//! A severity-prioritized, asynchronous logging pipeline with stoppable
//! background workers and idempotent disposal.
//!
//! ## Features
//!
//! - **Prioritized Delivery**: staged messages drain highest severity first
//! - **Asynchronous**: producers return immediately; a worker thread drains
//! - **Thread Safe**: designed for many concurrent producers
//! - **Deterministic Shutdown**: explicit, exactly-once disposal everywhere

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        ConsoleSignal, DisposalGuard, ErrorReport, HandlerId, LogMessage, LogPipeline,
        OutputMode, PipelineBuilder, PipelineError, PipelineMetrics, Result, Severity,
        SignalRegistry, StoppableWorker, Submitter, WorkerBuilder, DEFAULT_SHUTDOWN_TIMEOUT,
        DEFAULT_TICK_INTERVAL, MAX_CAUSE_DEPTH,
    };
    pub use crate::sinks::{ColorTable, ConsoleSink, ConsoleSinkBuilder};
}

pub use crate::core::{
    ConsoleSignal, DisposalGuard, ErrorReport, HandlerId, LogMessage, LogPipeline, OutputMode,
    PipelineBuilder, PipelineError, PipelineMetrics, Result, Severity, SignalRegistry,
    StoppableWorker, Submitter, WorkerBuilder, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TICK_INTERVAL,
    MAX_CAUSE_DEPTH,
};
pub use crate::sinks::{ColorTable, ConsoleSink, ConsoleSinkBuilder};
