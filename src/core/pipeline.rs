//! The severity-prioritized logging pipeline
//!
//! Producers append to a staging buffer and return immediately. A dedicated
//! drain worker periodically sweeps staging into the output queue, highest
//! severity first, and consumers poll messages off the front of that queue.
//! Every pipeline is an explicitly owned value; two pipelines never share
//! state unless handed the same instance.

use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::core::disposal::DisposalGuard;
use crate::core::message::LogMessage;
use crate::core::metrics::PipelineMetrics;
use crate::core::report::ErrorReport;
use crate::core::severity::Severity;
use crate::core::signal::{ConsoleSignal, HandlerId, SignalRegistry};
use crate::core::worker::{StoppableWorker, DEFAULT_TICK_INTERVAL};

/// Tag carried by the pipeline's own diagnostic messages.
pub const SELF_TAG: &str = "Pipeline";

/// Thread name of the drain worker unless overridden.
pub const DEFAULT_WORKER_NAME: &str = "log-pipeline";

/// How long an idle drain tick waits for the staged signal before giving up.
const DRAIN_IDLE_WAIT: Duration = Duration::from_millis(25);

/// A staged message plus its submission sequence number.
///
/// Heap order is severity-major so the drain always pops the most severe
/// staged message; equal severities fall back to submission order, keeping
/// multi-line reports contiguous.
struct Staged {
    seq: u64,
    message: LogMessage,
}

impl Ord for Staged {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.message
            .severity
            .cmp(&other.message.severity)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Staged {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Staged {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Staged {}

/// State shared between producers, the drain worker, and consumers.
struct PipelineShared {
    staging: Mutex<BinaryHeap<Staged>>,
    staged_signal: Condvar,
    output: Mutex<VecDeque<LogMessage>>,
    next_seq: AtomicU64,
    accepting: AtomicBool,
    metrics: PipelineMetrics,
}

impl PipelineShared {
    fn new() -> Self {
        Self {
            staging: Mutex::new(BinaryHeap::new()),
            staged_signal: Condvar::new(),
            output: Mutex::new(VecDeque::new()),
            next_seq: AtomicU64::new(0),
            accepting: AtomicBool::new(true),
            metrics: PipelineMetrics::new(),
        }
    }

    fn submit(&self, severity: Severity, tag: String, text: String) {
        if !self.accepting.load(Ordering::SeqCst) {
            self.metrics.record_rejected();
            return;
        }
        if severity.is_none() {
            // The reserved sentinel never travels as a real message.
            self.metrics.record_rejected();
            self.stage(LogMessage::new(
                Severity::Warning,
                SELF_TAG,
                "Discarded a message carrying the reserved None severity",
            ));
            return;
        }
        self.stage(LogMessage::new(severity, tag, text));
    }

    fn submit_report(&self, tag: &str, report: &ErrorReport) {
        if !self.accepting.load(Ordering::SeqCst) {
            self.metrics.record_rejected();
            return;
        }
        let messages: Vec<LogMessage> = report
            .render_lines()
            .into_iter()
            .map(|line| LogMessage::new(Severity::Fatal, tag, line))
            .collect();
        self.stage_batch(messages);
        self.metrics.record_report();
    }

    fn stage(&self, message: LogMessage) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut staging = self.staging.lock();
        staging.push(Staged { seq, message });
        self.metrics.record_submitted();
        self.staged_signal.notify_one();
    }

    /// Stage several messages under one lock so their sequence numbers are
    /// consecutive and no other producer can interleave.
    fn stage_batch(&self, messages: Vec<LogMessage>) {
        let mut staging = self.staging.lock();
        for message in messages {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            staging.push(Staged { seq, message });
            self.metrics.record_submitted();
        }
        self.staged_signal.notify_one();
    }

    /// Move everything currently staged to the output queue.
    ///
    /// With `idle_wait` set, an empty staging buffer blocks on the staged
    /// signal up to that long before returning. This is the only place the
    /// staging and output locks are held together, always in that order.
    fn drain_once(&self, idle_wait: Option<Duration>) -> usize {
        let mut staging = self.staging.lock();
        if staging.is_empty() {
            match idle_wait {
                Some(wait) => {
                    let _ = self.staged_signal.wait_for(&mut staging, wait);
                    if staging.is_empty() {
                        return 0;
                    }
                }
                None => return 0,
            }
        }

        let mut output = self.output.lock();
        let mut moved = 0usize;
        while let Some(staged) = staging.pop() {
            output.push_back(staged.message);
            moved += 1;
        }
        self.metrics.record_drained(moved as u64);
        moved
    }

    fn pop_front(&self) -> LogMessage {
        match self.output.lock().pop_front() {
            Some(message) => {
                self.metrics.record_popped();
                message
            }
            None => LogMessage::none(),
        }
    }
}

/// A cheap, clonable producer handle onto a pipeline.
///
/// Submitters share the pipeline's staging buffer and stay valid after the
/// pipeline is disposed; submissions are then rejected rather than failing.
/// Worker threads use one to report their own lifecycle through the very
/// pipeline they service.
#[derive(Clone)]
pub struct Submitter {
    shared: Arc<PipelineShared>,
}

impl Submitter {
    /// Stage one message. `Severity::None` is discarded with a self-reported
    /// warning.
    pub fn submit(&self, severity: Severity, tag: impl Into<String>, text: impl Into<String>) {
        self.shared.submit(severity, tag.into(), text.into());
    }

    pub fn verbose(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Verbose, tag, text);
    }

    pub fn debug(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Debug, tag, text);
    }

    pub fn info(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Info, tag, text);
    }

    pub fn warning(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Warning, tag, text);
    }

    pub fn error(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Error, tag, text);
    }

    pub fn fatal(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Fatal, tag, text);
    }

    /// Decompose an error and stage its report as one contiguous fatal batch.
    pub fn exception<E: std::error::Error + ?Sized>(&self, tag: impl Into<String>, error: &E) {
        self.exception_report(tag, &ErrorReport::from_error(error));
    }

    /// Stage an already-built report as one contiguous fatal batch.
    pub fn exception_report(&self, tag: impl Into<String>, report: &ErrorReport) {
        self.shared.submit_report(&tag.into(), report);
    }
}

impl fmt::Debug for Submitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("accepting", &self.shared.accepting.load(Ordering::SeqCst))
            .finish()
    }
}

/// An asynchronous, severity-prioritized logging pipeline.
///
/// Construction starts the drain worker; disposal (explicit or on drop)
/// stops it, sweeps the last staged messages into the output queue, and
/// unregisters any console-signal handler. Consumers poll with
/// [`pop_log`](Self::pop_log), which returns the `Severity::None` sentinel
/// when nothing is queued.
///
/// # Example
///
/// ```
/// use log_pipeline::LogPipeline;
///
/// let pipeline = LogPipeline::new();
/// pipeline.info("Example", "pipeline is up");
/// pipeline.drain_now();
///
/// let mut message = pipeline.pop_log();
/// while !message.is_none() {
///     println!("{}", message.log_line(Default::default()));
///     message = pipeline.pop_log();
/// }
/// pipeline.dispose();
/// ```
pub struct LogPipeline {
    shared: Arc<PipelineShared>,
    worker: Option<StoppableWorker>,
    signals: Option<(Arc<SignalRegistry>, HandlerId)>,
    guard: DisposalGuard,
}

impl LogPipeline {
    /// A pipeline with the default drain interval and no signal registry.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Stage one message for asynchronous delivery.
    ///
    /// Identity (process id, thread id, timestamp) is captured here, on the
    /// calling thread. Never blocks beyond the staging lock.
    pub fn submit(&self, severity: Severity, tag: impl Into<String>, text: impl Into<String>) {
        self.shared.submit(severity, tag.into(), text.into());
    }

    pub fn verbose(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Verbose, tag, text);
    }

    pub fn debug(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Debug, tag, text);
    }

    pub fn info(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Info, tag, text);
    }

    pub fn warning(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Warning, tag, text);
    }

    pub fn error(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Error, tag, text);
    }

    pub fn fatal(&self, tag: impl Into<String>, text: impl Into<String>) {
        self.submit(Severity::Fatal, tag, text);
    }

    /// Decompose `error` (type name, message, `source()` chain) into fatal
    /// messages, staged as one contiguous batch.
    pub fn exception<E: std::error::Error + ?Sized>(&self, tag: impl Into<String>, error: &E) {
        self.exception_report(tag, &ErrorReport::from_error(error));
    }

    /// Stage an already-built [`ErrorReport`] as one contiguous fatal batch.
    pub fn exception_report(&self, tag: impl Into<String>, report: &ErrorReport) {
        self.shared.submit_report(&tag.into(), report);
    }

    /// Take the oldest drained message, or the `Severity::None` sentinel
    /// when the output queue is empty.
    pub fn pop_log(&self) -> LogMessage {
        self.shared.pop_front()
    }

    /// Complete the hand-off of a popped message.
    ///
    /// Consumers pass each rendered message back here by value, making the
    /// pop/flush pairing explicit in the types.
    pub fn flush_log(&self, message: LogMessage) {
        drop(message);
    }

    /// Synchronously sweep staging into the output queue on the calling
    /// thread. Returns the number of messages moved.
    pub fn drain_now(&self) -> usize {
        self.shared.drain_once(None)
    }

    /// A clonable producer handle sharing this pipeline's staging buffer.
    pub fn submitter(&self) -> Submitter {
        Submitter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.shared.metrics
    }

    /// Whether submissions are still being accepted.
    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    /// Messages staged but not yet drained.
    pub fn staged_count(&self) -> usize {
        self.shared.staging.lock().len()
    }

    /// Messages drained and awaiting a consumer.
    pub fn queued_count(&self) -> usize {
        self.shared.output.lock().len()
    }

    /// Shut the pipeline down exactly once.
    ///
    /// Order: stop accepting, join the drain worker, sweep the last staged
    /// messages into the output queue (so everything accepted before this
    /// call stays observable via [`pop_log`](Self::pop_log)), then drop the
    /// signal handler. Repeated calls warn into the now-closed pipeline and
    /// count as rejected.
    pub fn dispose(&self) -> bool {
        let ran = self.guard.run(|| self.dispose_inner());
        if !ran {
            self.shared.submit(
                Severity::Warning,
                SELF_TAG.to_string(),
                "Dispose requested but the pipeline is already disposed".to_string(),
            );
        }
        ran
    }

    fn dispose_inner(&self) {
        self.shared.accepting.store(false, Ordering::SeqCst);
        if let Some(worker) = &self.worker {
            worker.dispose_graceful();
        }
        self.shared.drain_once(None);
        if let Some((registry, id)) = &self.signals {
            registry.unregister(*id);
        }
    }
}

impl Default for LogPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogPipeline")
            .field("accepting", &self.is_accepting())
            .field("staged", &self.staged_count())
            .field("queued", &self.queued_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for LogPipeline {
    fn drop(&mut self) {
        self.guard.run(|| self.dispose_inner());
    }
}

/// Builder for [`LogPipeline`]
#[derive(Debug)]
pub struct PipelineBuilder {
    tick_interval: Duration,
    worker_name: String,
    signals: Option<Arc<SignalRegistry>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            signals: None,
        }
    }

    /// Pause between drain sweeps (default 10 ms). Sub-millisecond values
    /// are raised to 1 ms.
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// OS thread name for the drain worker.
    #[must_use]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Register a console-interrupt handler with `registry` for the
    /// pipeline's lifetime.
    #[must_use]
    pub fn signals(mut self, registry: Arc<SignalRegistry>) -> Self {
        self.signals = Some(registry);
        self
    }

    /// Build the pipeline and start its drain worker.
    pub fn build(self) -> LogPipeline {
        let shared = Arc::new(PipelineShared::new());

        let interval = if self.tick_interval.is_zero() {
            Duration::from_millis(1)
        } else {
            self.tick_interval
        };

        let drain_shared = Arc::clone(&shared);
        let built = StoppableWorker::builder(self.worker_name)
            .tick(move || {
                drain_shared.drain_once(Some(DRAIN_IDLE_WAIT));
            })
            .tick_interval(interval)
            .diagnostics(Submitter {
                shared: Arc::clone(&shared),
            })
            .build();

        // The tick is always supplied and the interval floored above, so
        // this only fails when the OS refuses to spawn a thread. The
        // pipeline still works then: drain_now and the disposal sweep move
        // messages synchronously.
        let worker = match built {
            Ok(worker) => {
                if let Err(err) = worker.start() {
                    eprintln!("[PIPELINE ERROR] failed to start the drain worker: {}", err);
                }
                Some(worker)
            }
            Err(err) => {
                eprintln!("[PIPELINE ERROR] invalid drain worker configuration: {}", err);
                None
            }
        };

        let signals = self.signals.map(|registry| {
            let submitter = Submitter {
                shared: Arc::clone(&shared),
            };
            let id = registry.register(move |signal| {
                submitter.info(SELF_TAG, format!("Console signal received: {}", signal));
                matches!(
                    signal,
                    ConsoleSignal::Interrupt | ConsoleSignal::CloseWindow
                )
            });
            (registry, id)
        });

        LogPipeline {
            shared,
            worker,
            signals,
            guard: DisposalGuard::new(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    fn pop_all(shared: &PipelineShared) -> Vec<LogMessage> {
        let mut popped = Vec::new();
        loop {
            let message = shared.pop_front();
            if message.is_none() {
                break;
            }
            popped.push(message);
        }
        popped
    }

    #[test]
    fn test_drain_orders_by_severity() {
        let shared = PipelineShared::new();
        shared.submit(Severity::Info, "T".into(), "info".into());
        shared.submit(Severity::Fatal, "T".into(), "fatal".into());
        shared.submit(Severity::Debug, "T".into(), "debug".into());

        assert_eq!(shared.drain_once(None), 3);

        let texts: Vec<String> = pop_all(&shared).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["fatal", "info", "debug"]);
    }

    #[test]
    fn test_equal_severity_keeps_submission_order() {
        let shared = PipelineShared::new();
        for i in 0..5 {
            shared.submit(Severity::Info, "T".into(), format!("msg-{}", i));
        }
        shared.drain_once(None);

        let texts: Vec<String> = pop_all(&shared).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]);
    }

    #[test]
    fn test_reorder_is_per_batch_only() {
        let shared = PipelineShared::new();

        shared.submit(Severity::Info, "T".into(), "early info".into());
        shared.drain_once(None);
        shared.submit(Severity::Fatal, "T".into(), "late fatal".into());
        shared.drain_once(None);

        // The fatal arrived after the info was already drained, so it cannot
        // overtake it in the output queue.
        let texts: Vec<String> = pop_all(&shared).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["early info", "late fatal"]);
    }

    #[test]
    fn test_pop_on_empty_returns_sentinel() {
        let shared = PipelineShared::new();
        assert!(shared.pop_front().is_none());
        shared.drain_once(None);
        assert!(shared.pop_front().is_none());
    }

    #[test]
    fn test_none_severity_becomes_warning() {
        let shared = PipelineShared::new();
        shared.submit(Severity::None, "T".into(), "should vanish".into());
        shared.drain_once(None);

        let popped = pop_all(&shared);
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].severity, Severity::Warning);
        assert_eq!(popped[0].tag, SELF_TAG);
        assert!(popped[0].text.contains("None severity"));
        assert_eq!(shared.metrics.rejected_count(), 1);
    }

    #[test]
    fn test_rejected_after_accepting_cleared() {
        let shared = PipelineShared::new();
        shared.accepting.store(false, Ordering::SeqCst);
        shared.submit(Severity::Error, "T".into(), "too late".into());

        assert_eq!(shared.metrics.rejected_count(), 1);
        assert_eq!(shared.metrics.submitted_count(), 0);
        assert_eq!(shared.staging.lock().len(), 0);
    }

    #[test]
    fn test_report_lines_stay_contiguous() {
        let shared = PipelineShared::new();
        let report = ErrorReport::new("app::Boom", "it broke")
            .with_cause(ErrorReport::new("app::Root", "underneath"));

        shared.submit(Severity::Fatal, "Other".into(), "before".into());
        shared.submit_report("Crash", &report);
        shared.submit(Severity::Fatal, "Other".into(), "after".into());
        shared.drain_once(None);

        let texts: Vec<String> = pop_all(&shared).into_iter().map(|m| m.text).collect();
        let expected_report = report.render_lines();

        assert_eq!(texts[0], "before");
        assert_eq!(&texts[1..texts.len() - 1], expected_report.as_slice());
        assert_eq!(texts[texts.len() - 1], "after");
        assert_eq!(shared.metrics.report_count(), 1);
    }

    #[test]
    fn test_drain_wakes_on_staged_signal() {
        let shared = Arc::new(PipelineShared::new());

        let drainer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let start = Instant::now();
                let moved = shared.drain_once(Some(Duration::from_secs(5)));
                (moved, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        shared.submit(Severity::Info, "T".into(), "wake up".into());

        let (moved, waited) = drainer.join().expect("drain thread");
        assert_eq!(moved, 1);
        assert!(
            waited < Duration::from_secs(2),
            "drain slept through the signal for {:?}",
            waited
        );
    }

    #[test]
    fn test_metrics_track_flow() {
        let shared = PipelineShared::new();
        shared.submit(Severity::Info, "T".into(), "a".into());
        shared.submit(Severity::Info, "T".into(), "b".into());
        shared.drain_once(None);
        let _ = shared.pop_front();

        assert_eq!(shared.metrics.submitted_count(), 2);
        assert_eq!(shared.metrics.drained_count(), 2);
        assert_eq!(shared.metrics.popped_count(), 1);
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let pipeline = LogPipeline::new();
        pipeline.info("Smoke", "through the whole pipe");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            let message = pipeline.pop_log();
            if message.is_none() {
                thread::sleep(Duration::from_millis(5));
                continue;
            }
            let from_smoke = message.tag == "Smoke";
            seen.push(message.text.clone());
            pipeline.flush_log(message);
            if from_smoke {
                break;
            }
        }

        assert!(
            seen.iter().any(|text| text == "through the whole pipe"),
            "message never arrived: {:?}",
            seen
        );
        pipeline.dispose();
    }

    #[test]
    fn test_dispose_then_submit_is_rejected() {
        let pipeline = LogPipeline::new();
        assert!(pipeline.dispose());
        assert!(!pipeline.is_accepting());

        let rejected_before = pipeline.metrics().rejected_count();
        pipeline.error("Late", "nobody is listening");
        assert_eq!(pipeline.metrics().rejected_count(), rejected_before + 1);

        assert!(!pipeline.dispose());
        assert!(pipeline.is_disposed());
    }

    #[test]
    fn test_dispose_sweeps_staged_messages() {
        // A tick interval far beyond the test keeps the worker from draining
        // anything after its immediate first sweep.
        let pipeline = LogPipeline::builder()
            .tick_interval(Duration::from_secs(600))
            .build();
        thread::sleep(Duration::from_millis(100));

        pipeline.warning("Sweep", "staged right before disposal");
        pipeline.dispose();

        let mut texts = Vec::new();
        loop {
            let message = pipeline.pop_log();
            if message.is_none() {
                break;
            }
            texts.push(message.text.clone());
            pipeline.flush_log(message);
        }
        assert!(texts.iter().any(|t| t == "staged right before disposal"));
        assert_eq!(pipeline.staged_count(), 0);
    }

    #[test]
    fn test_submitter_outlives_disposal() {
        let pipeline = LogPipeline::new();
        let submitter = pipeline.submitter();
        submitter.info("Handle", "before disposal");
        pipeline.dispose();

        let rejected_before = pipeline.metrics().rejected_count();
        submitter.info("Handle", "after disposal");
        assert_eq!(pipeline.metrics().rejected_count(), rejected_before + 1);
    }

    #[test]
    fn test_signal_handler_lifecycle() {
        let registry = Arc::new(SignalRegistry::new());
        let pipeline = LogPipeline::builder()
            .signals(Arc::clone(&registry))
            .build();

        assert_eq!(registry.handler_count(), 1);
        assert!(registry.raise(ConsoleSignal::Interrupt));
        assert!(registry.raise(ConsoleSignal::CloseWindow));
        assert!(!registry.raise(ConsoleSignal::BreakKey));
        assert!(!registry.raise(ConsoleSignal::SystemShutdown));

        pipeline.dispose();
        assert_eq!(registry.handler_count(), 0);
    }
}
