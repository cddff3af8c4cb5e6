//! Cancellable handle for timer-driven work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::AbortHandle;

/// Token for one outstanding deferred or periodic activity.
///
/// Cancellation is idempotent and best-effort: cancelling before the delay
/// elapses prevents the firing, cancelling concurrently with a firing may or
/// may not suppress that one firing, and every subsequent firing of a
/// periodic schedule is suppressed once cancellation is observed. Cancelling
/// after a one-shot has fired is a no-op.
///
/// Dropping the handle does not cancel; the owning context keeps the timer
/// alive.
#[derive(Debug)]
pub struct ScheduledHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ScheduledHandle {
    pub(crate) fn new(cancelled: Arc<AtomicBool>, abort: AbortHandle) -> Self {
        Self {
            cancelled,
            abort: Some(abort),
        }
    }

    /// A handle that was never armed, returned by closed contexts.
    pub(crate) fn inert() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(true)),
            abort: None,
        }
    }

    /// Cancels the pending or recurring activity.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called (or the handle was
    /// never armed).
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_handle_reports_cancelled() {
        let handle = ScheduledHandle::inert();
        assert!(handle.is_cancelled());
        // Cancelling an inert handle stays a no-op.
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
