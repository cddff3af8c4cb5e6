//! Session and sequence identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an established client session.
///
/// Sessions scope a stream of ordered operations; this layer only carries the
/// id, it does not validate that the session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw session id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw id value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Per-session sequence number, strictly increasing from zero.
///
/// Negative sequences are unrepresentable; the unsigned type is the
/// validation. The server applies operations of one session in ascending
/// sequence order and uses the number for duplicate and gap detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// First sequence of a fresh session.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw sequence number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw sequence value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The sequence immediately after this one.
    #[must_use]
    pub const fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Client-side monotonic sequence source.
///
/// Lives inside the session's ordered execution context so that sequence
/// assignment and request dispatch happen atomically with respect to other
/// operations on the same session: whatever order `next` is called in is the
/// order requests go out in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceAssigner {
    next: u64,
}

impl SequenceAssigner {
    /// Starts handing out sequences from zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Resumes from an explicit sequence, e.g. after session recovery.
    #[must_use]
    pub const fn starting_at(next: SequenceNumber) -> Self {
        Self { next: next.value() }
    }

    /// Hands out the next sequence number.
    pub fn next(&mut self) -> SequenceNumber {
        let assigned = SequenceNumber::new(self.next);
        self.next += 1;
        assigned
    }

    /// The sequence the next call to [`next`](Self::next) will hand out.
    pub const fn peek(&self) -> SequenceNumber {
        SequenceNumber::new(self.next)
    }
}

impl Default for SequenceAssigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigner_is_gapless_and_monotonic() {
        let mut assigner = SequenceAssigner::new();
        for expected in 0..100 {
            assert_eq!(assigner.next(), SequenceNumber::new(expected));
        }
        assert_eq!(assigner.peek(), SequenceNumber::new(100));
    }

    #[test]
    fn assigner_resumes_from_an_explicit_point() {
        let mut assigner = SequenceAssigner::starting_at(SequenceNumber::new(7));
        assert_eq!(assigner.next(), SequenceNumber::new(7));
        assert_eq!(assigner.next(), SequenceNumber::new(8));
    }

    #[test]
    fn successor_is_the_next_sequence() {
        assert_eq!(SequenceNumber::ZERO.successor(), SequenceNumber::new(1));
    }
}
