//! Error types for task submission and delivery.

use std::any::Any;

/// Failure delivered through a [`SubmitFuture`](crate::context::SubmitFuture).
///
/// Fire-and-forget tasks never surface this type; their panics are logged and
/// re-raised on the pool worker instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The submitted closure panicked while running on the context.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The task was dropped before it ran, typically because the context was
    /// closed or dropped with the task still queued.
    #[error("task was dropped before it ran")]
    Cancelled,
}

/// Renders a panic payload into something loggable.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_str_and_string_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(17_u32);
        assert_eq!(panic_message(boxed.as_ref()), "opaque panic payload");
    }
}
