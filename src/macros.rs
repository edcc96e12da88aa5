//! Logging macros for ergonomic message formatting.
//!
//! These macros provide a convenient interface for submitting to a pipeline
//! with automatic string formatting, similar to `println!` and `format!`.
//! They accept anything with the producer API, so a [`Submitter`] works the
//! same as the pipeline itself.
//!
//! [`Submitter`]: crate::Submitter
//!
//! # Examples
//!
//! ```
//! use log_pipeline::prelude::*;
//! use log_pipeline::info;
//!
//! let pipeline = LogPipeline::new();
//!
//! // Basic logging
//! info!(pipeline, "Server", "started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(pipeline, "Server", "listening on port {}", port);
//! # pipeline.dispose();
//! ```

/// Submit a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::log;
/// log!(pipeline, Severity::Info, "Startup", "simple message");
/// log!(pipeline, Severity::Error, "Http", "status code: {}", 500);
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! log {
    ($pipeline:expr, $severity:expr, $tag:expr, $($arg:tt)+) => {
        $pipeline.submit($severity, $tag, format!($($arg)+))
    };
}

/// Submit a verbose message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::verbose;
/// verbose!(pipeline, "Parser", "entering block at offset {}", 192);
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! verbose {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Verbose, $tag, $($arg)+)
    };
}

/// Submit a debug message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::debug;
/// debug!(pipeline, "Cache", "hit ratio: {}", 0.97);
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! debug {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Debug, $tag, $($arg)+)
    };
}

/// Submit an info message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::info;
/// info!(pipeline, "App", "processing {} items", 100);
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! info {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Info, $tag, $($arg)+)
    };
}

/// Submit a warning message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::warning;
/// warning!(pipeline, "Disk", "retry attempt {} of {}", 3, 5);
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! warning {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Warning, $tag, $($arg)+)
    };
}

/// Submit an error message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::error;
/// error!(pipeline, "Db", "failed to connect: {}", "timeout");
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! error {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Error, $tag, $($arg)+)
    };
}

/// Submit a fatal message.
///
/// # Examples
///
/// ```
/// # use log_pipeline::prelude::*;
/// # let pipeline = LogPipeline::new();
/// use log_pipeline::fatal;
/// fatal!(pipeline, "Core", "unable to recover: {}", "disk full");
/// # pipeline.dispose();
/// ```
#[macro_export]
macro_rules! fatal {
    ($pipeline:expr, $tag:expr, $($arg:tt)+) => {
        $crate::log!($pipeline, $crate::Severity::Fatal, $tag, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogPipeline, Severity};

    #[test]
    fn test_log_macro() {
        let pipeline = LogPipeline::new();
        log!(pipeline, Severity::Info, "Test", "plain message");
        log!(pipeline, Severity::Info, "Test", "formatted: {}", 42);
        pipeline.dispose();
    }

    #[test]
    fn test_leveled_macros() {
        let pipeline = LogPipeline::new();
        verbose!(pipeline, "Test", "verbose message");
        debug!(pipeline, "Test", "count: {}", 5);
        info!(pipeline, "Test", "items: {}", 100);
        warning!(pipeline, "Test", "retry {} of {}", 1, 3);
        error!(pipeline, "Test", "code: {}", 500);
        fatal!(pipeline, "Test", "failure: {}", "system");

        pipeline.dispose();
        assert!(pipeline.metrics().submitted_count() >= 6);
    }

    #[test]
    fn test_macros_work_through_a_submitter() {
        let pipeline = LogPipeline::new();
        let submitter = pipeline.submitter();
        info!(submitter, "Handle", "routed through a clone");
        pipeline.dispose();
    }
}
