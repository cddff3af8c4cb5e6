//! Shared worker pool boundary.
//!
//! Ordered contexts are clients of a pool, never owners of its threads: many
//! contexts multiplex their drain jobs onto one pool, which amortizes thread
//! count across a large number of sessions and connections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::context::{RepeatingTask, Task};
use crate::scheduled::ScheduledHandle;

/// Worker pool collaborator interface.
///
/// `submit` runs a job on some worker thread; the two `schedule_*` methods
/// use the pool's timer facility and hand back a cancellable handle. No
/// method blocks the caller.
pub trait WorkerPool: Send + Sync {
    /// Runs `job` on some worker thread.
    fn submit(&self, job: Task);

    /// Runs `job` on some worker thread once `delay` has elapsed.
    fn schedule_once(&self, delay: Duration, job: Task) -> ScheduledHandle;

    /// Runs `job` after `delay`, then again every `interval` at a fixed rate
    /// until the handle is cancelled.
    fn schedule_repeating(
        &self,
        delay: Duration,
        interval: Duration,
        job: RepeatingTask,
    ) -> ScheduledHandle;
}

/// [`WorkerPool`] backed by a tokio multi-thread runtime.
///
/// Jobs become short spawned tasks on the runtime; timers use `tokio::time`.
/// The pool only borrows the runtime via its [`Handle`], so the runtime must
/// outlive every context built on top of it.
#[derive(Debug, Clone)]
pub struct TokioPool {
    handle: Handle,
}

impl TokioPool {
    /// Wraps an explicit runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Wraps the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, same as
    /// [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl WorkerPool for TokioPool {
    fn submit(&self, job: Task) {
        self.handle.spawn(async move { job() });
    }

    fn schedule_once(&self, delay: Duration, job: Task) -> ScheduledHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&cancelled);
        let timer = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if !observed.load(Ordering::Acquire) {
                job();
            }
        });
        ScheduledHandle::new(cancelled, timer.abort_handle())
    }

    fn schedule_repeating(
        &self,
        delay: Duration,
        interval: Duration,
        job: RepeatingTask,
    ) -> ScheduledHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&cancelled);
        let timer = self.handle.spawn(async move {
            let start = tokio::time::Instant::now() + delay;
            // Default tick behavior is burst catch-up, i.e. fixed-rate.
            let mut ticks = tokio::time::interval_at(start, interval);
            loop {
                ticks.tick().await;
                if observed.load(Ordering::Acquire) {
                    return;
                }
                job();
            }
        });
        ScheduledHandle::new(cancelled, timer.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[tokio::test]
    async fn submit_runs_the_job() {
        let pool = TokioPool::current();
        let (tx, rx) = tokio::sync::oneshot::channel();
        pool.submit(Box::new(move || {
            let _ = tx.send(42);
        }));
        assert_eq!(rx.await, Ok(42));
    }

    #[tokio::test]
    async fn schedule_once_respects_the_delay() {
        let pool = TokioPool::current();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let started = Instant::now();
        pool.schedule_once(
            Duration::from_millis(50),
            Box::new(move || {
                let _ = tx.send(started.elapsed());
            }),
        );
        let elapsed = rx.await.unwrap();
        assert!(elapsed >= Duration::from_millis(50), "fired at {elapsed:?}");
    }

    #[tokio::test]
    async fn cancel_before_expiry_suppresses_the_firing() {
        let pool = TokioPool::current();
        let fired = Arc::new(AtomicBool::new(false));
        let observer = Arc::clone(&fired);
        let handle = pool.schedule_once(
            Duration::from_millis(50),
            Box::new(move || observer.store(true, Ordering::SeqCst)),
        );
        handle.cancel();
        assert!(handle.is_cancelled());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn repeating_schedule_stops_after_cancel() {
        let pool = TokioPool::current();
        let firings = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&firings);
        let handle = pool.schedule_repeating(
            Duration::from_millis(10),
            Duration::from_millis(10),
            Box::new(move || {
                observer.fetch_add(1, Ordering::SeqCst);
            }),
        );

        while firings.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.cancel();
        handle.cancel(); // idempotent

        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = firings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(firings.load(Ordering::SeqCst), settled);
        assert!(settled >= 1);
    }
}
