//! Uniform error decomposition for fatal exception reporting

/// Maximum number of cause levels rendered by [`ErrorReport::render_lines`].
///
/// A source chain longer than this (including a self-referential one) is cut
/// off with an explicit truncation line rather than followed forever.
pub const MAX_CAUSE_DEPTH: usize = 8;

/// A caught error flattened into loggable parts.
///
/// This is the shape [`LogPipeline::exception`] consumes: a type identity, a
/// message, optional auxiliary key/value data, an optional stack trace, and an
/// optional cause decomposed the same way.
///
/// [`LogPipeline::exception`]: crate::core::pipeline::LogPipeline::exception
///
/// # Example
///
/// ```
/// use log_pipeline::ErrorReport;
///
/// let report = ErrorReport::new("db::ConnectError", "connection refused")
///     .with_data("host", "10.0.0.7")
///     .with_cause(ErrorReport::new("std::io::Error", "ECONNREFUSED"));
///
/// assert_eq!(report.short_kind(), "ConnectError");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Fully qualified type identity of the error.
    pub kind: String,
    /// Human-readable message text.
    pub message: String,
    /// Auxiliary key/value data attached to the error.
    pub data: Vec<(String, String)>,
    /// Stack trace text, when one was captured.
    pub trace: Option<String>,
    /// The causing error, decomposed the same way.
    pub cause: Option<Box<ErrorReport>>,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            data: Vec::new(),
            trace: None,
            cause: None,
        }
    }

    /// Attach one auxiliary key/value pair.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    /// Attach stack trace text.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Attach the causing error.
    #[must_use]
    pub fn with_cause(mut self, cause: ErrorReport) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Decompose a concrete error and its `source()` chain.
    ///
    /// The top-level type name is exact; sources are type-erased by
    /// `std::error::Error`, so their recorded kind is whatever
    /// `type_name_of_val` can recover. Chain walking stops after
    /// [`MAX_CAUSE_DEPTH`] sources, so a self-referential chain terminates.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut report = Self::new(std::any::type_name::<E>(), error.to_string());
        if let Some(source) = error.source() {
            report.cause = Some(Box::new(Self::from_source(source, 1)));
        }
        report
    }

    fn from_source(error: &(dyn std::error::Error + 'static), depth: usize) -> Self {
        let mut report = Self::new(std::any::type_name_of_val(error), error.to_string());
        if depth < MAX_CAUSE_DEPTH {
            if let Some(source) = error.source() {
                report.cause = Some(Box::new(Self::from_source(source, depth + 1)));
            }
        }
        report
    }

    /// The last path segment of [`kind`](Self::kind).
    pub fn short_kind(&self) -> &str {
        self.kind.rsplit("::").next().unwrap_or(&self.kind)
    }

    /// Flatten this report into the deterministic fatal-line sequence.
    ///
    /// Order per report: short kind, full kind, message, auxiliary data
    /// (when present), stack trace (when present), then the cause rendered
    /// recursively under an `Inner exception:` label. At most
    /// [`MAX_CAUSE_DEPTH`] reports are rendered; a longer chain ends with a
    /// truncation line.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        lines
    }

    fn render_into(&self, lines: &mut Vec<String>, depth: usize) {
        lines.push(format!("Exception: {}", self.short_kind()));
        lines.push(format!("Full name: {}", self.kind));
        lines.push(format!("Message: {}", self.message));

        if !self.data.is_empty() {
            lines.push("Additional information:".to_string());
            for (key, value) in &self.data {
                lines.push(format!("{}: {}", key, value));
            }
        }

        if let Some(trace) = &self.trace {
            lines.push("Stacktrace:".to_string());
            lines.push(trace.clone());
        }

        if let Some(cause) = &self.cause {
            if depth + 1 >= MAX_CAUSE_DEPTH {
                lines.push(format!(
                    "Inner exception chain truncated after {} levels",
                    MAX_CAUSE_DEPTH
                ));
            } else {
                lines.push("Inner exception:".to_string());
                cause.render_into(lines, depth + 1);
            }
        }
    }
}
