//! Protocol error types.

use crate::types::SequenceNumber;

/// Failure to construct or transcode a request.
///
/// Builders validate at `build()` time, so a partially configured builder is
/// fine as long as every required field is set before the final step. Nothing
/// is ever silently coerced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// No session id was provided.
    #[error("session is required")]
    MissingSession,

    /// No sequence number was provided.
    #[error("sequence is required")]
    MissingSequence,

    /// No operation payload was provided.
    #[error("payload is required")]
    MissingPayload,

    /// The wire codec rejected the value.
    #[error("codec failure: {message}")]
    Codec {
        /// Rendered codec error.
        message: String,
    },
}

/// Server-side sequencing failure.
///
/// Duplicates and gaps are ordinary admission outcomes, not errors; this type
/// covers only the case where a gap persisted past the buffer's budget and
/// the client must resend in order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// Too many out-of-order requests buffered while waiting for a missing
    /// sequence.
    #[error(
        "gap budget exceeded: {buffered} requests held waiting for sequence {missing} \
         (capacity {capacity}); resend in order"
    )]
    GapBudgetExceeded {
        /// The sequence the buffer is still waiting for.
        missing: SequenceNumber,
        /// Number of requests currently held.
        buffered: usize,
        /// Maximum number of requests the buffer will hold.
        capacity: usize,
    },
}
