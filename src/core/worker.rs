//! Cancellable background worker threads
//!
//! A [`StoppableWorker`] owns one named OS thread running a cooperative
//! tick loop: an optional init hook, a tick hook invoked once per interval,
//! and an optional terminate hook once a stop is requested. Stopping is
//! always cooperative; the thread is never killed mid-tick.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::disposal::DisposalGuard;
use crate::core::error::{PipelineError, Result};
use crate::core::pipeline::Submitter;

/// Default pause between tick invocations.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// How long `Drop` waits for the thread before giving up on it.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval used while waiting for the thread to finish.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct WorkerShared {
    /// True from `start()` until the thread body has fully exited.
    running: AtomicBool,
    /// Cooperative stop request observed between ticks.
    stop: AtomicBool,
    /// Pause between ticks, in milliseconds.
    interval_ms: AtomicU64,
    /// Pairs with `wake_signal` so `stop()` can interrupt the inter-tick wait.
    wake_lock: Mutex<()>,
    wake_signal: Condvar,
}

struct WorkerHooks {
    init: Option<Box<dyn FnMut() + Send>>,
    tick: Box<dyn FnMut() + Send>,
    terminate: Option<Box<dyn FnMut() + Send>>,
}

/// Clears `running` when the thread body exits, including by panic, so
/// waiters never spin on a dead thread.
struct RunningGuard {
    shared: Arc<WorkerShared>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }
}

/// A restartable background thread driven by a tick function.
///
/// The lifecycle is Unstarted -> Running -> StopRequested -> Stopped, and a
/// stopped worker can be started again with the same hooks. `running` flips
/// inside [`start`](Self::start) before it returns, so a caller that starts
/// a worker and immediately calls [`stop_and_wait`](Self::stop_and_wait)
/// always observes the full transition.
///
/// # Example
///
/// ```
/// use log_pipeline::StoppableWorker;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&ticks);
///
/// let worker = StoppableWorker::builder("doc-worker")
///     .tick(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .tick_interval(Duration::from_millis(5))
///     .spawn()?;
///
/// std::thread::sleep(Duration::from_millis(50));
/// worker.stop_and_wait();
/// assert!(ticks.load(Ordering::SeqCst) > 0);
/// # Ok::<(), log_pipeline::PipelineError>(())
/// ```
pub struct StoppableWorker {
    name: String,
    shared: Arc<WorkerShared>,
    hooks: Arc<Mutex<WorkerHooks>>,
    diag: Option<Submitter>,
    handle: Mutex<Option<JoinHandle<()>>>,
    guard: DisposalGuard,
}

impl StoppableWorker {
    /// Start configuring a worker whose OS thread carries `name`.
    pub fn builder(name: impl Into<String>) -> WorkerBuilder {
        WorkerBuilder::new(name)
    }

    /// The configured thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the worker thread is currently alive.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Whether a cooperative stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop.load(Ordering::SeqCst)
    }

    /// The current pause between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.shared.interval_ms.load(Ordering::Relaxed))
    }

    /// Change the pause between ticks, effective from the next iteration.
    pub fn set_tick_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(PipelineError::config(
                "worker",
                "tick interval must be greater than zero",
            ));
        }
        let millis = interval.as_millis().min(u64::MAX as u128) as u64;
        self.shared.interval_ms.store(millis.max(1), Ordering::Relaxed);
        Ok(())
    }

    /// Spawn the worker thread.
    ///
    /// `running` is already true when this returns. Starting an
    /// already-running worker is a warned no-op; starting a disposed worker
    /// is an error.
    pub fn start(&self) -> Result<()> {
        if self.guard.is_disposed() {
            return Err(PipelineError::config(
                "worker",
                "cannot start a disposed worker",
            ));
        }
        if self.shared.running.swap(true, Ordering::SeqCst) {
            self.diag_warning("Start requested but the worker is already running");
            return Ok(());
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        self.reap_handle();

        let shared = Arc::clone(&self.shared);
        let hooks = Arc::clone(&self.hooks);
        let diag = self.diag.clone();
        let name = self.name.clone();

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run_loop(shared, hooks, diag, name));

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(err.into())
            }
        }
    }

    /// Request a cooperative stop without waiting for it.
    ///
    /// Takes effect before the next tick. A worker that is not running is a
    /// warned no-op.
    pub fn stop(&self) {
        if !self.is_running() {
            self.diag_warning("Stop requested but the worker is not running");
            return;
        }
        self.request_stop();
    }

    /// Request a stop and block until the thread has fully exited.
    ///
    /// Must not be called from the worker's own tick; the join would wait on
    /// the calling thread itself.
    pub fn stop_and_wait(&self) {
        self.stop();
        self.wait_until_stopped(None);
    }

    /// Bounded variant of [`stop_and_wait`](Self::stop_and_wait).
    ///
    /// Returns `false` when the thread is still alive after `timeout`; the
    /// stop request stays in effect either way.
    pub fn stop_and_wait_timeout(&self, timeout: Duration) -> bool {
        self.stop();
        self.wait_until_stopped(Some(Instant::now() + timeout))
    }

    /// Stop the worker without waiting, exactly once.
    ///
    /// Returns `false` (after a warning) when disposal already happened or is
    /// in progress on another thread.
    pub fn dispose(&self) -> bool {
        let ran = self.guard.run(|| self.request_stop());
        if !ran {
            self.diag_warning("Dispose requested but the worker is already disposed");
        }
        ran
    }

    /// Stop the worker and wait for the thread to exit, exactly once.
    pub fn dispose_graceful(&self) -> bool {
        let ran = self.guard.run(|| {
            self.request_stop();
            self.wait_until_stopped(None);
        });
        if !ran {
            self.diag_warning("Dispose requested but the worker is already disposed");
        }
        ran
    }

    /// Whether [`dispose`](Self::dispose) or
    /// [`dispose_graceful`](Self::dispose_graceful) has completed.
    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }

    fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        // Taking the lock orders this notify after any in-progress check of
        // the stop flag, so the inter-tick wait cannot miss it.
        let _wake = self.shared.wake_lock.lock();
        self.shared.wake_signal.notify_all();
    }

    fn wait_until_stopped(&self, deadline: Option<Instant>) -> bool {
        while self.shared.running.load(Ordering::SeqCst) {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return false;
                }
            }
            thread::sleep(STOP_POLL_INTERVAL);
        }
        self.reap_handle();
        true
    }

    fn reap_handle(&self) {
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                eprintln!(
                    "[PIPELINE ERROR] worker '{}' panicked during its run",
                    self.name
                );
            }
        }
    }

    fn diag_warning(&self, text: &str) {
        match &self.diag {
            Some(diag) => diag.warning(self.name.as_str(), text),
            None => eprintln!("[PIPELINE WARNING] {}: {}", self.name, text),
        }
    }
}

fn run_loop(
    shared: Arc<WorkerShared>,
    hooks: Arc<Mutex<WorkerHooks>>,
    diag: Option<Submitter>,
    name: String,
) {
    let _running = RunningGuard {
        shared: Arc::clone(&shared),
    };
    // Redundant with the flip in start(); keeps the flag truthful if the
    // worker is ever restarted from a hook on another thread.
    shared.running.store(true, Ordering::SeqCst);

    if let Some(diag) = &diag {
        diag.info(name.as_str(), "Worker thread initializing");
    }
    {
        let mut hooks = hooks.lock();
        if let Some(init) = hooks.init.as_mut() {
            init();
        }
    }

    loop {
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
        {
            let mut hooks = hooks.lock();
            (hooks.tick)();
        }

        let interval = Duration::from_millis(shared.interval_ms.load(Ordering::Relaxed).max(1));
        let mut slot = shared.wake_lock.lock();
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
        let _ = shared.wake_signal.wait_for(&mut slot, interval);
    }

    if let Some(diag) = &diag {
        diag.info(name.as_str(), "Worker thread terminating");
    }
    let mut hooks = hooks.lock();
    if let Some(terminate) = hooks.terminate.as_mut() {
        terminate();
    }
}

impl fmt::Debug for StoppableWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoppableWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("stop_requested", &self.is_stop_requested())
            .field("tick_interval", &self.tick_interval())
            .finish()
    }
}

impl Drop for StoppableWorker {
    /// Gracefully stops the thread unless it was already disposed, bounded
    /// by [`DEFAULT_SHUTDOWN_TIMEOUT`].
    fn drop(&mut self) {
        self.guard.run(|| {
            self.request_stop();
            if !self.wait_until_stopped(Some(Instant::now() + DEFAULT_SHUTDOWN_TIMEOUT)) {
                eprintln!(
                    "[PIPELINE ERROR] worker '{}' did not stop within {:?}",
                    self.name, DEFAULT_SHUTDOWN_TIMEOUT
                );
            }
        });
    }
}

/// Builder for [`StoppableWorker`]
pub struct WorkerBuilder {
    name: String,
    tick_interval: Duration,
    init: Option<Box<dyn FnMut() + Send>>,
    tick: Option<Box<dyn FnMut() + Send>>,
    terminate: Option<Box<dyn FnMut() + Send>>,
    diag: Option<Submitter>,
}

impl WorkerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            init: None,
            tick: None,
            terminate: None,
            diag: None,
        }
    }

    /// Hook invoked once on the worker thread before the first tick.
    #[must_use]
    pub fn on_init(mut self, init: impl FnMut() + Send + 'static) -> Self {
        self.init = Some(Box::new(init));
        self
    }

    /// The function invoked once per loop iteration. Required.
    #[must_use]
    pub fn tick(mut self, tick: impl FnMut() + Send + 'static) -> Self {
        self.tick = Some(Box::new(tick));
        self
    }

    /// Hook invoked once on the worker thread after the last tick.
    #[must_use]
    pub fn on_terminate(mut self, terminate: impl FnMut() + Send + 'static) -> Self {
        self.terminate = Some(Box::new(terminate));
        self
    }

    /// Set the pause between ticks (default 10 ms).
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Route lifecycle notices and warnings through a pipeline instead of
    /// stderr.
    #[must_use]
    pub fn diagnostics(mut self, diag: Submitter) -> Self {
        self.diag = Some(diag);
        self
    }

    /// Validate the configuration and produce an unstarted worker.
    pub fn build(self) -> Result<StoppableWorker> {
        let tick = self.tick.ok_or_else(|| {
            PipelineError::config("worker", "a tick function is required")
        })?;
        if self.tick_interval.is_zero() {
            return Err(PipelineError::config(
                "worker",
                "tick interval must be greater than zero",
            ));
        }
        let interval_ms = self.tick_interval.as_millis().min(u64::MAX as u128) as u64;

        Ok(StoppableWorker {
            name: self.name,
            shared: Arc::new(WorkerShared {
                running: AtomicBool::new(false),
                stop: AtomicBool::new(false),
                interval_ms: AtomicU64::new(interval_ms.max(1)),
                wake_lock: Mutex::new(()),
                wake_signal: Condvar::new(),
            }),
            hooks: Arc::new(Mutex::new(WorkerHooks {
                init: self.init,
                tick,
                terminate: self.terminate,
            })),
            diag: self.diag,
            handle: Mutex::new(None),
            guard: DisposalGuard::new(),
        })
    }

    /// Build the worker and start it in one call.
    pub fn spawn(self) -> Result<StoppableWorker> {
        let worker = self.build()?;
        worker.start()?;
        Ok(worker)
    }
}
