//! # Sequin Runtime - ordered execution over a shared pool
//!
//! A concurrency substrate for session-oriented protocol code: many logical
//! FIFO execution domains ([`OrderedContext`]) multiplexed onto one shared
//! worker pool ([`WorkerPool`], concretely [`TokioPool`]). Tasks submitted to
//! one context run strictly in submission order and never concurrently with
//! each other, while distinct contexts interleave freely across the pool's
//! threads.
//!
//! ## Modules
//!
//! - **context**: the [`ExecutionContext`] contract, context identifiers, and
//!   the future-returning [`submit`](ExecutionContextExt::submit) layer
//! - **ordered**: the pool-backed engine enforcing the at-most-one-runner
//!   invariant
//! - **pool**: the worker pool boundary and its tokio realization
//! - **scheduled**: cancellable handles for deferred and periodic work
//! - **error**: structured task failure delivery

pub mod context;
pub mod error;
pub mod ordered;
pub mod pool;
pub mod scheduled;

pub use context::{
    current_context, ContextId, ExecutionContext, ExecutionContextExt, RepeatingTask,
    SubmitFuture, Task,
};
pub use error::TaskError;
pub use ordered::OrderedContext;
pub use pool::{TokioPool, WorkerPool};
pub use scheduled::ScheduledHandle;
