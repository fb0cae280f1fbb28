//! Cancellable trailing-debounce task
//!
//! Arm/cancel/fire-once semantics: arming replaces any pending task, so a
//! burst of calls within the quiet period executes the action exactly once,
//! after the last call. Cancellation on teardown prevents a stray write
//! after disposal.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A trailing-debounce timer over a fixed quiet period.
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    /// Schedule `action` to run after the quiet period, cancelling any
    /// previously scheduled run.
    pub fn arm<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.quiet_period;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Cancel the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a run is currently scheduled (or still executing).
    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
