//! Shared run-state for the two halves of a chat session.
//!
//! The receive task and the send loop both observe one `RunState`. It starts
//! out running and makes exactly one transition to stopped, performed by
//! whichever party gets there first: the signal listener, the send loop on
//! local end-of-input, or the receive task on a terminal condition.
//!
//! The flag itself is an `AtomicBool`. A `CancellationToken` rides along as a
//! wake-up so that a loop parked on terminal input notices the transition.
//! Nothing uses the token to interrupt socket reads: a blocked receive task
//! only wakes when the peer closes or sends data.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

/// Session run-state shared between the receive task and the send loop.
#[derive(Debug)]
pub struct RunState {
    running: AtomicBool,
    wake: CancellationToken,
}

impl RunState {
    /// Creates a run-state in the running position.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            wake: CancellationToken::new(),
        }
    }

    /// Returns true while the session is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Marks the session as stopped and wakes anything waiting in [`stopped`].
    ///
    /// Returns true only for the call that performed the transition.
    ///
    /// [`stopped`]: RunState::stopped
    pub fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if was_running {
            debug!("Run-state switched to stopped");
            self.wake.cancel();
        }
        was_running
    }

    /// Resolves once the session has been stopped.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.wake.cancelled()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_run_state_starts_running() {
        let state = RunState::new();
        assert!(state.is_running());
    }

    #[test]
    fn test_stop_transitions_exactly_once() {
        let state = RunState::new();
        assert!(state.stop());
        assert!(!state.is_running());
        assert!(!state.stop());
        assert!(!state.is_running());
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_stop() {
        let state = Arc::new(RunState::new());
        let waiter = Arc::clone(&state);

        let handle = tokio::spawn(async move {
            waiter.stopped().await;
            waiter.is_running()
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        state.stop();

        let still_running = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .expect("waiter should not panic");
        assert!(!still_running);
    }

    #[tokio::test]
    async fn test_stopped_resolves_immediately_when_already_stopped() {
        let state = RunState::new();
        state.stop();
        tokio::time::timeout(Duration::from_millis(100), state.stopped())
            .await
            .expect("already stopped");
    }
}
