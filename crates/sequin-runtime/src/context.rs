//! Execution context contract.
//!
//! An [`ExecutionContext`] is one ordering domain: every task handed to it
//! runs in submission order, one at a time, regardless of which worker thread
//! of the shared pool actually performs the work. Stateful components (a
//! client session, a server-side peer connection) each hold their own context
//! and program exclusively against this trait.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;

use crate::error::{panic_message, TaskError};
use crate::scheduled::ScheduledHandle;

/// A fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work fired repeatedly by a periodic schedule.
pub type RepeatingTask = Box<dyn Fn() + Send + Sync + 'static>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one ordering domain, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Mints the next process-wide identifier.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identifier value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

thread_local! {
    static CURRENT_CONTEXT: Cell<Option<ContextId>> = const { Cell::new(None) };
}

/// Returns the context whose task is running on the current thread, if any.
///
/// Set only for the duration of one task's execution; between tasks the pool
/// worker carries no affiliation. Intended for diagnostics and reentrancy
/// checks, not for control flow.
pub fn current_context() -> Option<ContextId> {
    CURRENT_CONTEXT.with(Cell::get)
}

/// Tags the current thread with a context id until dropped.
pub(crate) struct ContextTag {
    previous: Option<ContextId>,
}

impl ContextTag {
    pub(crate) fn enter(id: ContextId) -> Self {
        let previous = CURRENT_CONTEXT.with(|current| current.replace(Some(id)));
        Self { previous }
    }
}

impl Drop for ContextTag {
    fn drop(&mut self) {
        let previous = self.previous;
        CURRENT_CONTEXT.with(|current| current.set(previous));
    }
}

/// Ordered task execution over a shared worker pool.
///
/// Implementations guarantee that tasks accepted by [`execute`] run in
/// acceptance order with no two tasks of the same context ever running
/// concurrently. Nothing here blocks the caller; all work happens on the
/// pool's workers.
///
/// [`execute`]: ExecutionContext::execute
pub trait ExecutionContext: Send + Sync {
    /// Identifier of this ordering domain.
    fn id(&self) -> ContextId;

    /// Enqueues `task` for ordered execution and returns immediately.
    ///
    /// On a closed context this is a logged no-op and the task is dropped.
    fn execute(&self, task: Task);

    /// Enqueues `task` after `delay` has elapsed on the pool's timer.
    ///
    /// The firing enqueues, it never runs the task inline, so scheduled work
    /// obeys the same ordering as directly executed work. Cancelling the
    /// returned handle before expiry prevents the enqueue; cancelling after
    /// is a no-op.
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle;

    /// Enqueues `task` after `delay`, then again every `interval`.
    ///
    /// Retriggering is fixed-rate: firings are spaced from the schedule's
    /// start, not from each task's completion, so a stalled queue catches up
    /// in a burst once it drains. Each firing is an independent enqueue.
    fn schedule_repeating(
        &self,
        delay: Duration,
        interval: Duration,
        task: RepeatingTask,
    ) -> ScheduledHandle;

    /// Raises the advisory blocked flag.
    ///
    /// The flag carries no enforcement inside the context; upstream
    /// flow-control reads it to detect a backed-up queue.
    fn block(&self);

    /// Clears the advisory blocked flag.
    fn unblock(&self);

    /// Reads the advisory blocked flag.
    fn is_blocked(&self) -> bool;

    /// Marks the context inert.
    ///
    /// Tasks already accepted still drain; new submissions are rejected as
    /// logged no-ops. Closing twice is harmless.
    fn close(&self);

    /// Whether [`close`](ExecutionContext::close) has been called.
    fn is_closed(&self) -> bool;

    /// The tracing span tasks of this context run inside.
    ///
    /// Uncaught task panics are reported through this span before being
    /// re-raised on the pool worker.
    fn span(&self) -> &tracing::Span;
}

/// Convenience layer over [`ExecutionContext`].
pub trait ExecutionContextExt: ExecutionContext {
    /// [`execute`](ExecutionContext::execute) without boxing at the call site.
    fn execute_fn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute(Box::new(f));
    }

    /// Runs `f` on the context and delivers its result through a future.
    ///
    /// A panic inside `f` completes the future with [`TaskError::Panicked`]
    /// instead of reaching the drain loop's fatal path; the caller has opted
    /// into structured error delivery. If the task is dropped unrun (context
    /// closed) the future completes with [`TaskError::Cancelled`].
    fn submit<T, F>(&self, f: F) -> SubmitFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.execute(Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(f)).map_err(|panic| TaskError::Panicked {
                message: panic_message(panic.as_ref()),
            });
            // Receiver may have lost interest; that is not an error here.
            let _ = tx.send(result);
        }));
        SubmitFuture { rx }
    }
}

impl<C: ExecutionContext + ?Sized> ExecutionContextExt for C {}

/// Future returned by [`ExecutionContextExt::submit`].
///
/// Completes exactly once, from the drain side, with the closure's value or
/// the failure that kept it from producing one.
#[derive(Debug)]
pub struct SubmitFuture<T> {
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> Future for SubmitFuture<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TaskError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
