//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors surfaced synchronously to callers.
///
/// Lifecycle misuse (double start, repeated dispose) is not represented
/// here; those calls warn through the pipeline and return normally.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error while writing to a sink target
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PipelineError::Other(msg.into())
    }
}
