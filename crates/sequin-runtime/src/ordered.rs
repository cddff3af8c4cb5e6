//! Pool-backed ordered context.
//!
//! The engine multiplexes many logical FIFO queues onto one shared worker
//! pool while guaranteeing that at most one task per context is ever running.
//! The whole trick is a queue and a `running` flag behind a single mutex:
//! `execute` appends and, if no drain is active, flips the flag and submits
//! one drain job while still holding the lock, so a concurrent `execute`
//! cannot miss an active runner. The drain pops one task under the lock and
//! runs it outside the lock until the queue empties.

use std::collections::VecDeque;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::context::{ContextId, ContextTag, ExecutionContext, RepeatingTask, Task};
use crate::pool::WorkerPool;
use crate::scheduled::ScheduledHandle;

/// Execution context multiplexed onto a shared worker pool.
///
/// Cheap to clone; clones share the same queue and ordering domain. Typical
/// use is one context per client session or per server-side connection, all
/// over one pool.
#[derive(Clone)]
pub struct OrderedContext {
    inner: Arc<Inner>,
}

struct Inner {
    id: ContextId,
    pool: Arc<dyn WorkerPool>,
    state: Mutex<QueueState>,
    blocked: AtomicBool,
    closed: AtomicBool,
    span: tracing::Span,
}

struct QueueState {
    tasks: VecDeque<Task>,
    /// True while a drain job for this context exists on the pool.
    running: bool,
}

impl OrderedContext {
    /// Creates a context draining onto `pool`.
    pub fn new(pool: Arc<dyn WorkerPool>) -> Self {
        let id = ContextId::next();
        Self {
            inner: Arc::new(Inner {
                id,
                pool,
                state: Mutex::new(QueueState {
                    tasks: VecDeque::new(),
                    running: false,
                }),
                blocked: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                span: tracing::info_span!("ordered_context", context = id.value()),
            }),
        }
    }

    /// Number of tasks waiting in the queue (excludes the one running).
    pub fn queued(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }
}

/// Appends a task and starts a drain if none is active.
fn enqueue(inner: &Arc<Inner>, task: Task) {
    if inner.closed.load(Ordering::Acquire) {
        debug!(context = %inner.id, "dropping task submitted to closed context");
        return;
    }
    let mut state = inner.state.lock();
    state.tasks.push_back(task);
    if !state.running {
        state.running = true;
        let drainer = Arc::clone(inner);
        // Submitted under the lock: a racing enqueue sees running=true.
        inner.pool.submit(Box::new(move || drain(&drainer)));
    }
}

/// Pops and runs tasks until the queue is empty.
///
/// Task panics are logged, the runner flag is re-armed so the context cannot
/// wedge, and the panic is then re-raised into the pool worker's own fault
/// boundary.
fn drain(inner: &Arc<Inner>) {
    loop {
        let task = {
            let mut state = inner.state.lock();
            match state.tasks.pop_front() {
                Some(task) => task,
                None => {
                    state.running = false;
                    return;
                }
            }
        };

        let entered = inner.span.enter();
        let tag = ContextTag::enter(inner.id);
        let outcome = catch_unwind(AssertUnwindSafe(task));
        drop(tag);

        if let Err(panic) = outcome {
            error!(
                context = %inner.id,
                panic = %crate::error::panic_message(panic.as_ref()),
                "uncaught panic in ordered task"
            );
            drop(entered);
            {
                let mut state = inner.state.lock();
                if state.tasks.is_empty() {
                    state.running = false;
                } else {
                    // Keep draining on a fresh job; this worker is lost to
                    // the re-raise below.
                    let drainer = Arc::clone(inner);
                    inner.pool.submit(Box::new(move || drain(&drainer)));
                }
            }
            resume_unwind(panic);
        }
    }
}

impl ExecutionContext for OrderedContext {
    fn id(&self) -> ContextId {
        self.inner.id
    }

    fn execute(&self, task: Task) {
        enqueue(&self.inner, task);
    }

    fn schedule(&self, delay: Duration, task: Task) -> ScheduledHandle {
        if self.inner.closed.load(Ordering::Acquire) {
            debug!(context = %self.inner.id, "rejecting schedule on closed context");
            return ScheduledHandle::inert();
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .pool
            .schedule_once(delay, Box::new(move || enqueue(&inner, task)))
    }

    fn schedule_repeating(
        &self,
        delay: Duration,
        interval: Duration,
        task: RepeatingTask,
    ) -> ScheduledHandle {
        if self.inner.closed.load(Ordering::Acquire) {
            debug!(context = %self.inner.id, "rejecting schedule on closed context");
            return ScheduledHandle::inert();
        }
        let inner = Arc::clone(&self.inner);
        let task: Arc<dyn Fn() + Send + Sync> = Arc::from(task);
        self.inner.pool.schedule_repeating(
            delay,
            interval,
            Box::new(move || {
                let run = Arc::clone(&task);
                enqueue(&inner, Box::new(move || run()));
            }),
        )
    }

    fn block(&self) {
        self.inner.blocked.store(true, Ordering::Relaxed);
    }

    fn unblock(&self) {
        self.inner.blocked.store(false, Ordering::Relaxed);
    }

    fn is_blocked(&self) -> bool {
        self.inner.blocked.load(Ordering::Relaxed)
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn span(&self) -> &tracing::Span {
        &self.inner.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContextExt;
    use crate::pool::TokioPool;

    fn context() -> OrderedContext {
        OrderedContext::new(Arc::new(TokioPool::current()))
    }

    #[tokio::test]
    async fn blocked_flag_is_advisory_set_and_get() {
        let ctx = context();
        assert!(!ctx.is_blocked());
        ctx.block();
        assert!(ctx.is_blocked());
        // Blocking must not stop execution.
        assert_eq!(ctx.submit(|| 9).await, Ok(9));
        ctx.unblock();
        assert!(!ctx.is_blocked());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_new_work() {
        let ctx = context();
        ctx.close();
        ctx.close();
        assert!(ctx.is_closed());

        assert_eq!(ctx.queued(), 0);
        ctx.execute_fn(|| unreachable!("closed context must drop tasks"));
        assert_eq!(ctx.queued(), 0);

        let handle = ctx.schedule(Duration::from_millis(1), Box::new(|| {}));
        assert!(handle.is_cancelled());
        let handle = ctx.schedule_repeating(
            Duration::from_millis(1),
            Duration::from_millis(1),
            Box::new(|| {}),
        );
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn clones_share_one_ordering_domain() {
        let ctx = context();
        let twin = ctx.clone();
        assert_eq!(ctx.id(), twin.id());

        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10_u32 {
            let log = Arc::clone(&log);
            let target = if i % 2 == 0 { &ctx } else { &twin };
            target.execute_fn(move || log.lock().push(i));
        }
        // Enqueued last, so everything above has run once this resolves.
        ctx.submit(|| ()).await.unwrap();
        assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
    }
}
