//! Server-side sequence admission.
//!
//! The session manager feeds every arriving operation request through a
//! [`SequenceBuffer`]. A request is released for application only when its
//! sequence equals the next expected one; earlier sequences are duplicates of
//! already-applied operations (the cached result is replayed, never the
//! operation), later sequences are held in a bounded buffer until the gap
//! fills or the budget runs out. Nothing is ever silently dropped.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::SequenceError;
use crate::types::SequenceNumber;

/// Outcome of offering one sequenced value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<T> {
    /// The offered value, plus any buffered successors it made contiguous,
    /// in ascending sequence order. Apply them all.
    Ready(Vec<(SequenceNumber, T)>),

    /// The value arrived ahead of a gap and is held until `missing` shows up.
    Buffered {
        /// The sequence the buffer is still waiting for.
        missing: SequenceNumber,
    },

    /// The sequence was already applied; replay the cached result instead of
    /// re-applying the operation.
    Duplicate {
        /// The duplicated sequence.
        sequence: SequenceNumber,
    },
}

/// Per-session admission buffer enforcing ascending, gapless application.
#[derive(Debug)]
pub struct SequenceBuffer<T> {
    next_expected: SequenceNumber,
    pending: BTreeMap<u64, T>,
    capacity: usize,
}

impl<T> SequenceBuffer<T> {
    /// Buffer expecting sequence zero first, holding at most `capacity`
    /// out-of-order values.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::starting_at(SequenceNumber::ZERO, capacity)
    }

    /// Buffer resuming from an explicit expected sequence.
    #[must_use]
    pub fn starting_at(next_expected: SequenceNumber, capacity: usize) -> Self {
        Self {
            next_expected,
            pending: BTreeMap::new(),
            capacity,
        }
    }

    /// The sequence the buffer will release next.
    pub fn next_expected(&self) -> SequenceNumber {
        self.next_expected
    }

    /// Number of out-of-order values currently held.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Offers one sequenced value for admission.
    ///
    /// Re-offering a sequence that is already buffered replaces the held
    /// value; a retransmission carries the same operation, so this is
    /// idempotent.
    pub fn offer(
        &mut self,
        sequence: SequenceNumber,
        value: T,
    ) -> Result<Admission<T>, SequenceError> {
        if sequence < self.next_expected {
            debug!(%sequence, expected = %self.next_expected, "duplicate sequence");
            return Ok(Admission::Duplicate { sequence });
        }

        if sequence > self.next_expected {
            if self.pending.len() >= self.capacity && !self.pending.contains_key(&sequence.value())
            {
                return Err(SequenceError::GapBudgetExceeded {
                    missing: self.next_expected,
                    buffered: self.pending.len(),
                    capacity: self.capacity,
                });
            }
            debug!(%sequence, expected = %self.next_expected, "buffering ahead of gap");
            self.pending.insert(sequence.value(), value);
            return Ok(Admission::Buffered {
                missing: self.next_expected,
            });
        }

        // Exactly the expected sequence: release it and every buffered
        // successor that is now contiguous.
        let mut run = vec![(sequence, value)];
        self.next_expected = sequence.successor();
        while let Some(value) = self.pending.remove(&self.next_expected.value()) {
            run.push((self.next_expected, value));
            self.next_expected = self.next_expected.successor();
        }
        Ok(Admission::Ready(run))
    }
}

/// Cache of results for already-applied sequences.
///
/// Backs idempotent replay of duplicates: the server re-sends the remembered
/// result rather than applying the operation twice. Retention is a sliding
/// window; once a result ages out, a duplicate that old can no longer be
/// answered and the session is expected to have moved on.
#[derive(Debug)]
pub struct ReplayCache<R> {
    results: BTreeMap<u64, R>,
    retention: usize,
}

impl<R> ReplayCache<R> {
    /// Cache remembering the results of the last `retention` sequences.
    #[must_use]
    pub fn new(retention: usize) -> Self {
        Self {
            results: BTreeMap::new(),
            retention,
        }
    }

    /// Records the result of an applied sequence, evicting the oldest entry
    /// beyond the retention window.
    pub fn record(&mut self, sequence: SequenceNumber, result: R) {
        self.results.insert(sequence.value(), result);
        while self.results.len() > self.retention {
            if let Some((&oldest, _)) = self.results.iter().next() {
                self.results.remove(&oldest);
            }
        }
    }

    /// Looks up the remembered result for a duplicated sequence.
    pub fn replay(&self, sequence: SequenceNumber) -> Option<&R> {
        self.results.get(&sequence.value())
    }
}
