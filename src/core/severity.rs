//! Severity levels for log messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered severity classification of a log message.
///
/// The numeric order drives both drain priority (higher values drain first)
/// and display color selection. `None` is a sentinel meaning "no message
/// available": [`LogPipeline::pop_log`] returns it on an empty queue, and it
/// is never assigned to a real message.
///
/// [`LogPipeline::pop_log`]: crate::core::pipeline::LogPipeline::pop_log
///
/// # Example
///
/// ```
/// use log_pipeline::Severity;
///
/// assert!(Severity::Fatal > Severity::Error);
/// assert!(Severity::Verbose > Severity::None);
/// assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Sentinel for "no message available"; never carried by a real message.
    None = 0,
    Verbose = 1,
    Debug = 2,
    Info = 3,
    Warning = 4,
    Error = 5,
    Fatal = 6,
}

impl Severity {
    /// Upper-case name, padded nowhere; `None` renders as `"NONE"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Verbose => "VERBOSE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Numeric rank used for priority comparisons.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this is the "no message available" sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, Severity::None)
    }

    /// All severities a real message can carry, lowest first.
    pub const REAL: [Severity; 6] = [
        Severity::Verbose,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive parse of a real severity. The `None` sentinel is not
    /// a level callers may ask for, so `"none"` is rejected like any other
    /// unknown name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VERBOSE" => Ok(Severity::Verbose),
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "WARN" | "WARNING" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            _ => Err(format!("Invalid severity: '{}'", s)),
        }
    }
}
