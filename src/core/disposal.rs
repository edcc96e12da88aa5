//! Idempotent disposal tracking
//!
//! Shared by every component that owns background resources: cleanup must run
//! exactly once, and callers that arrive late (or re-enter from inside the
//! cleanup itself) must be turned away without blocking.

use parking_lot::Mutex;

/// Tracks the disposal state of a component.
///
/// [`run`](Self::run) executes a cleanup closure at most once across the
/// guard's lifetime. While the closure runs, the guard is marked as mid
/// disposal, so concurrent and re-entrant calls return immediately instead of
/// waiting for the cleanup to finish.
///
/// # Example
///
/// ```
/// use log_pipeline::DisposalGuard;
///
/// let guard = DisposalGuard::new();
/// assert!(guard.run(|| { /* release resources */ }));
/// assert!(!guard.run(|| unreachable!("cleanup runs once")));
/// assert!(guard.is_disposed());
/// ```
#[derive(Debug, Default)]
pub struct DisposalGuard {
    state: Mutex<DisposalState>,
}

#[derive(Debug, Default)]
struct DisposalState {
    disposed: bool,
    disposing: bool,
}

impl DisposalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cleanup has already completed.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Whether a cleanup is currently in flight on some thread.
    pub fn is_disposing(&self) -> bool {
        self.state.lock().disposing
    }

    /// Run `cleanup` if this guard has not been claimed yet.
    ///
    /// Returns `true` when `cleanup` ran to completion on this call, `false`
    /// when disposal already happened or is in progress elsewhere. The state
    /// lock is not held while `cleanup` runs, so losing callers never block
    /// on a slow cleanup.
    pub fn run(&self, cleanup: impl FnOnce()) -> bool {
        {
            let mut state = self.state.lock();
            if state.disposed || state.disposing {
                return false;
            }
            state.disposing = true;
        }

        cleanup();

        let mut state = self.state.lock();
        state.disposing = false;
        state.disposed = true;
        true
    }
}
