//! Console signal dispatch
//!
//! Replaces process-global console handlers with an explicitly owned
//! registry. Components register a callback, receive an id, and remove
//! themselves during their own disposal; nothing outlives its owner.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Console events a handler can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleSignal {
    /// Ctrl+C pressed.
    Interrupt,
    /// The hosting console window is closing.
    CloseWindow,
    /// Ctrl+Break pressed.
    BreakKey,
    /// The user is logging off.
    LogOff,
    /// The system is shutting down.
    SystemShutdown,
}

impl ConsoleSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleSignal::Interrupt => "Interrupt",
            ConsoleSignal::CloseWindow => "CloseWindow",
            ConsoleSignal::BreakKey => "BreakKey",
            ConsoleSignal::LogOff => "LogOff",
            ConsoleSignal::SystemShutdown => "SystemShutdown",
        }
    }
}

impl fmt::Display for ConsoleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a registered handler for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type SignalHandler = Arc<dyn Fn(ConsoleSignal) -> bool + Send + Sync>;

/// An explicitly owned chain of console-signal handlers.
///
/// Handlers run newest-first, and the first one returning `true` marks the
/// signal handled and ends the chain, mirroring how stacked console control
/// handlers behave on the platforms that have them.
///
/// # Example
///
/// ```
/// use log_pipeline::{ConsoleSignal, SignalRegistry};
///
/// let registry = SignalRegistry::new();
/// registry.register(|_| false);
/// let id = registry.register(|signal| signal == ConsoleSignal::Interrupt);
///
/// assert!(registry.raise(ConsoleSignal::Interrupt));
/// assert!(!registry.raise(ConsoleSignal::BreakKey));
/// assert!(registry.unregister(id));
/// ```
#[derive(Default)]
pub struct SignalRegistry {
    handlers: Mutex<Vec<(HandlerId, SignalHandler)>>,
    next_id: AtomicU64,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to the front of the dispatch order.
    pub fn register(
        &self,
        handler: impl Fn(ConsoleSignal) -> bool + Send + Sync + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` when the id is unknown or already
    /// removed.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        match handlers.iter().position(|(registered, _)| *registered == id) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Dispatch a signal through the chain, newest handler first.
    ///
    /// Returns `true` as soon as a handler claims the signal; older handlers
    /// are not consulted. The handler list is snapshotted before dispatch, so
    /// a handler may register or unregister without deadlocking the chain.
    pub fn raise(&self, signal: ConsoleSignal) -> bool {
        let snapshot: Vec<SignalHandler> = self
            .handlers
            .lock()
            .iter()
            .rev()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            if handler(signal) {
                return true;
            }
        }
        false
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
