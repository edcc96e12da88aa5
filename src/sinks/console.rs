//! Console sink implementation
//!
//! Polls a pipeline's output queue and writes each message to a terminal
//! (or any injected writer), colored by severity. Updates run either
//! manually or on a timer worker owned by the sink.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use colored::{Color, Colorize};
use parking_lot::{Mutex, RwLock};

use crate::core::disposal::DisposalGuard;
use crate::core::error::Result;
use crate::core::message::{LogMessage, OutputMode};
use crate::core::pipeline::LogPipeline;
use crate::core::severity::Severity;
use crate::core::signal::{ConsoleSignal, HandlerId, SignalRegistry};
use crate::core::worker::StoppableWorker;

/// Tag carried by the sink's own diagnostic messages.
pub const SINK_TAG: &str = "Console";

/// Thread name of the auto-update worker.
const AUTO_UPDATE_WORKER_NAME: &str = "console-sink";

/// Per-severity terminal colors.
///
/// Defaults follow the classic console scheme: white for verbose, blue for
/// debug, green for info, yellow for warnings, red for errors and bright red
/// for fatals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: [Color; 6],
}

impl ColorTable {
    pub fn new() -> Self {
        Self {
            colors: [
                Color::White,
                Color::Blue,
                Color::Green,
                Color::Yellow,
                Color::Red,
                Color::BrightRed,
            ],
        }
    }

    /// The color used for `severity`. The `None` sentinel is never rendered;
    /// asking for it yields the verbose color.
    pub fn color_for(&self, severity: Severity) -> Color {
        match severity.as_u8() {
            0 => self.colors[0],
            value => self.colors[(value - 1) as usize],
        }
    }

    /// Override the color for one severity. Setting the `None` sentinel is
    /// ignored.
    pub fn set(&mut self, severity: Severity, color: Color) {
        if !severity.is_none() {
            self.colors[(severity.as_u8() - 1) as usize] = color;
        }
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Render and write state shared with the auto-update worker.
struct SinkState {
    pipeline: Arc<LogPipeline>,
    target: Mutex<Box<dyn Write + Send>>,
    colors: RwLock<ColorTable>,
    output_mode: OutputMode,
    dynamic_padding: AtomicBool,
    /// Widest `"{header}: "` seen so far; only grows.
    header_pad: AtomicUsize,
}

impl SinkState {
    /// Drain the output queue into the writer until the sentinel comes back.
    fn update(&self) -> Result<()> {
        let mut wrote = false;
        loop {
            let message = self.pipeline.pop_log();
            if message.is_none() {
                break;
            }
            let line = self.render(&message);
            {
                let mut target = self.target.lock();
                writeln!(target, "{}", line)?;
            }
            self.pipeline.flush_log(message);
            wrote = true;
        }
        if wrote {
            self.target.lock().flush()?;
        }
        Ok(())
    }

    fn render(&self, message: &LogMessage) -> String {
        let header = message.header_line(self.output_mode);
        let line = if self.dynamic_padding.load(Ordering::Relaxed) {
            let wanted = header.len() + 2;
            let previous = self.header_pad.fetch_max(wanted, Ordering::Relaxed);
            let width = previous.max(wanted);
            format!("{:<width$}{}", format!("{}: ", header), message.text, width = width)
        } else {
            message.log_line(self.output_mode)
        };

        let color = self.colors.read().color_for(message.severity);
        line.color(color).to_string()
    }
}

/// A polling console writer for one pipeline.
///
/// Every rendered line is written whole under the writer lock, so messages
/// from concurrent producers never interleave mid-line. Disposal shuts the
/// pipeline down as well and renders whatever it left queued.
///
/// # Example
///
/// ```
/// use log_pipeline::{ConsoleSink, LogPipeline};
/// use std::sync::Arc;
///
/// let pipeline = Arc::new(LogPipeline::new());
/// let sink = ConsoleSink::builder(Arc::clone(&pipeline))
///     .auto_update(true)
///     .build();
///
/// pipeline.info("Example", "rendered by the sink worker");
/// std::thread::sleep(std::time::Duration::from_millis(100));
/// sink.dispose();
/// ```
pub struct ConsoleSink {
    state: Arc<SinkState>,
    auto_worker: Mutex<Option<StoppableWorker>>,
    signals: Option<(Arc<SignalRegistry>, HandlerId)>,
    guard: DisposalGuard,
}

impl ConsoleSink {
    /// A sink with default settings writing to stdout.
    pub fn new(pipeline: Arc<LogPipeline>) -> Self {
        Self::builder(pipeline).build()
    }

    pub fn builder(pipeline: Arc<LogPipeline>) -> ConsoleSinkBuilder {
        ConsoleSinkBuilder::new(pipeline)
    }

    /// The pipeline this sink consumes from.
    pub fn pipeline(&self) -> &LogPipeline {
        &self.state.pipeline
    }

    /// Pop, render and write every queued message, then flush the writer.
    pub fn update(&self) -> Result<()> {
        self.state.update()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.state.output_mode
    }

    pub fn dynamic_padding(&self) -> bool {
        self.state.dynamic_padding.load(Ordering::Relaxed)
    }

    /// Toggle header padding. The learned pad width survives toggling.
    pub fn set_dynamic_padding(&self, enabled: bool) {
        self.state.dynamic_padding.store(enabled, Ordering::Relaxed);
    }

    /// Override the color used for one severity.
    pub fn set_color(&self, severity: Severity, color: Color) {
        self.state.colors.write().set(severity, color);
    }

    pub fn auto_update(&self) -> bool {
        self.auto_worker.lock().is_some()
    }

    /// Start or stop the timer worker that calls
    /// [`update`](Self::update). Toggling to the current value is a no-op.
    pub fn set_auto_update(&self, enabled: bool) {
        if self.guard.is_disposed() {
            self.state
                .pipeline
                .warning(SINK_TAG, "Auto-update change requested on a disposed sink");
            return;
        }

        let mut slot = self.auto_worker.lock();
        if enabled == slot.is_some() {
            return;
        }

        if enabled {
            let state = Arc::clone(&self.state);
            let built = StoppableWorker::builder(AUTO_UPDATE_WORKER_NAME)
                .tick(move || {
                    // Writing is what just failed, so this cannot go through
                    // the pipeline.
                    if let Err(err) = state.update() {
                        eprintln!("[PIPELINE ERROR] console sink update failed: {}", err);
                    }
                })
                .diagnostics(self.state.pipeline.submitter())
                .spawn();
            match built {
                Ok(worker) => *slot = Some(worker),
                Err(err) => {
                    eprintln!(
                        "[PIPELINE ERROR] failed to start the console sink worker: {}",
                        err
                    );
                }
            }
        } else if let Some(worker) = slot.take() {
            worker.dispose_graceful();
        }
    }

    /// Shut the sink and its pipeline down exactly once.
    ///
    /// Order: stop the auto-update worker, dispose the pipeline (which joins
    /// its drain and sweeps the last staged messages), render everything
    /// still queued, then drop the signal handler.
    pub fn dispose(&self) -> bool {
        let ran = self.guard.run(|| self.dispose_inner());
        if !ran {
            self.state
                .pipeline
                .warning(SINK_TAG, "Dispose requested but the sink is already disposed");
        }
        ran
    }

    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    fn dispose_inner(&self) {
        if let Some(worker) = self.auto_worker.lock().take() {
            worker.dispose_graceful();
        }
        self.state.pipeline.dispose();
        if let Err(err) = self.state.update() {
            eprintln!(
                "[PIPELINE ERROR] final console sink update failed: {}",
                err
            );
        }
        if let Some((registry, id)) = &self.signals {
            registry.unregister(*id);
        }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("output_mode", &self.state.output_mode)
            .field("dynamic_padding", &self.dynamic_padding())
            .field("auto_update", &self.auto_update())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        self.guard.run(|| self.dispose_inner());
    }
}

/// Builder for [`ConsoleSink`]
pub struct ConsoleSinkBuilder {
    pipeline: Arc<LogPipeline>,
    output_mode: OutputMode,
    dynamic_padding: bool,
    auto_update: bool,
    signals: Option<Arc<SignalRegistry>>,
    colors: ColorTable,
    target: Option<Box<dyn Write + Send>>,
}

impl ConsoleSinkBuilder {
    pub fn new(pipeline: Arc<LogPipeline>) -> Self {
        Self {
            pipeline,
            output_mode: OutputMode::default(),
            dynamic_padding: false,
            auto_update: false,
            signals: None,
            colors: ColorTable::new(),
            target: None,
        }
    }

    /// Header layout for rendered messages (default `ThreadTime`).
    #[must_use]
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Align message text across lines by padding headers (default off).
    #[must_use]
    pub fn dynamic_padding(mut self, enabled: bool) -> Self {
        self.dynamic_padding = enabled;
        self
    }

    /// Start the timer worker immediately after build (default off).
    #[must_use]
    pub fn auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }

    /// Register a console-interrupt handler with `registry` for the sink's
    /// lifetime.
    #[must_use]
    pub fn signals(mut self, registry: Arc<SignalRegistry>) -> Self {
        self.signals = Some(registry);
        self
    }

    /// Override the color for one severity.
    #[must_use]
    pub fn color(mut self, severity: Severity, color: Color) -> Self {
        self.colors.set(severity, color);
        self
    }

    /// Write somewhere other than stdout. Tests inject a buffer here.
    #[must_use]
    pub fn target(mut self, target: Box<dyn Write + Send>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn build(self) -> ConsoleSink {
        let state = Arc::new(SinkState {
            pipeline: self.pipeline,
            target: Mutex::new(
                self.target
                    .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write + Send>),
            ),
            colors: RwLock::new(self.colors),
            output_mode: self.output_mode,
            dynamic_padding: AtomicBool::new(self.dynamic_padding),
            header_pad: AtomicUsize::new(0),
        });

        let signals = self.signals.map(|registry| {
            let submitter = state.pipeline.submitter();
            let id = registry.register(move |signal| {
                submitter.verbose(SINK_TAG, format!("Console signal received: {}", signal));
                matches!(
                    signal,
                    ConsoleSignal::Interrupt | ConsoleSignal::CloseWindow
                )
            });
            (registry, id)
        });

        let sink = ConsoleSink {
            state,
            auto_worker: Mutex::new(None),
            signals,
            guard: DisposalGuard::new(),
        };
        if self.auto_update {
            sink.set_auto_update(true);
        }
        sink
    }
}
