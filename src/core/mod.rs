//! Core pipeline types

pub mod disposal;
pub mod error;
pub mod message;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod severity;
pub mod signal;
pub mod worker;

pub use disposal::DisposalGuard;
pub use error::{PipelineError, Result};
pub use message::{LogMessage, OutputMode};
pub use metrics::PipelineMetrics;
pub use pipeline::{LogPipeline, PipelineBuilder, Submitter, DEFAULT_WORKER_NAME, SELF_TAG};
pub use report::{ErrorReport, MAX_CAUSE_DEPTH};
pub use severity::Severity;
pub use signal::{ConsoleSignal, HandlerId, SignalRegistry};
pub use worker::{
    StoppableWorker, WorkerBuilder, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TICK_INTERVAL,
};
