//! Pipeline metrics for observability
//!
//! Provides counters for monitoring pipeline health, including accepted and
//! rejected submissions, drain throughput, and consumed output.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for pipeline observability
///
/// Tracks statistics about pipeline operation, particularly useful for
/// detecting submissions lost to a disposed pipeline and for watching the
/// staging-to-output flow keep up with producers.
///
/// # Example
///
/// ```
/// use log_pipeline::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
///
/// // Record events
/// metrics.record_submitted();
/// metrics.record_rejected();
///
/// // Check counts
/// assert_eq!(metrics.submitted_count(), 1);
/// assert_eq!(metrics.rejected_count(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Number of messages accepted into the staging buffer
    submitted_count: AtomicU64,

    /// Number of messages refused because the pipeline stopped accepting
    rejected_count: AtomicU64,

    /// Number of messages moved from staging to output by the drain worker
    drained_count: AtomicU64,

    /// Number of messages handed to consumers by `pop_log`
    popped_count: AtomicU64,

    /// Number of fatal error reports emitted
    report_count: AtomicU64,
}

impl PipelineMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            drained_count: AtomicU64::new(0),
            popped_count: AtomicU64::new(0),
            report_count: AtomicU64::new(0),
        }
    }

    /// Get the number of accepted submissions
    #[inline]
    pub fn submitted_count(&self) -> u64 {
        self.submitted_count.load(Ordering::Relaxed)
    }

    /// Get the number of rejected submissions
    #[inline]
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Get the number of messages drained to the output queue
    #[inline]
    pub fn drained_count(&self) -> u64 {
        self.drained_count.load(Ordering::Relaxed)
    }

    /// Get the number of messages consumed from the output queue
    #[inline]
    pub fn popped_count(&self) -> u64 {
        self.popped_count.load(Ordering::Relaxed)
    }

    /// Get the number of fatal error reports emitted
    #[inline]
    pub fn report_count(&self) -> u64 {
        self.report_count.load(Ordering::Relaxed)
    }

    /// Record an accepted submission
    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a rejected submission
    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record messages drained to the output queue
    #[inline]
    pub fn record_drained(&self, count: u64) -> u64 {
        self.drained_count.fetch_add(count, Ordering::Relaxed)
    }

    /// Record a message consumed from the output queue
    #[inline]
    pub fn record_popped(&self) -> u64 {
        self.popped_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an emitted fatal error report
    #[inline]
    pub fn record_report(&self) -> u64 {
        self.report_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Get rejection rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no submissions have been attempted.
    pub fn rejection_rate(&self) -> f64 {
        let rejected = self.rejected_count() as f64;
        let total = self.submitted_count() as f64 + rejected;
        if total == 0.0 {
            0.0
        } else {
            (rejected / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    ///
    /// Useful for testing or periodic reset of metrics.
    pub fn reset(&self) {
        self.submitted_count.store(0, Ordering::Relaxed);
        self.rejected_count.store(0, Ordering::Relaxed);
        self.drained_count.store(0, Ordering::Relaxed);
        self.popped_count.store(0, Ordering::Relaxed);
        self.report_count.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted_count: AtomicU64::new(self.submitted_count()),
            rejected_count: AtomicU64::new(self.rejected_count()),
            drained_count: AtomicU64::new(self.drained_count()),
            popped_count: AtomicU64::new(self.popped_count()),
            report_count: AtomicU64::new(self.report_count()),
        }
    }
}
