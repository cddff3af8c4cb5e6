//! Session-scoped operation requests.
//!
//! Clients submit operations against a session-bound replicated state machine
//! with these messages. Every operation request carries a strictly increasing
//! per-session sequence number; the server applies operations of one session
//! in exactly the order the client issued them and uses the sequence for
//! duplicate and gap detection. A failed request must be resent by the client
//! under the same sequence.
//!
//! Shared fields live in header structs embedded by each concrete variant, so
//! there is one validation routine instead of an inheritance chain. Requests
//! are immutable once built; builders are single-use and validate only at
//! `build()`.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::types::{SequenceNumber, SessionId};

/// Shared fields of any request scoped to a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHeader {
    /// The session this request belongs to.
    pub session: SessionId,
}

impl SessionHeader {
    /// Validates presence of the session id.
    pub fn try_new(session: Option<SessionId>) -> Result<Self, RequestError> {
        let session = session.ok_or(RequestError::MissingSession)?;
        Ok(Self { session })
    }
}

/// Shared fields of any sequenced operation request.
///
/// The single source of truth for session/sequence validation; every variant
/// builder funnels through [`try_new`](Self::try_new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHeader {
    /// The session this operation belongs to.
    pub session: SessionId,
    /// Position of this operation in the session's total order.
    pub sequence: SequenceNumber,
}

impl OperationHeader {
    /// Validates presence of both shared fields.
    pub fn try_new(
        session: Option<SessionId>,
        sequence: Option<SequenceNumber>,
    ) -> Result<Self, RequestError> {
        let session = session.ok_or(RequestError::MissingSession)?;
        let sequence = sequence.ok_or(RequestError::MissingSequence)?;
        Ok(Self { session, sequence })
    }
}

/// Anything addressed to a particular client session.
pub trait SessionScoped {
    /// The session this request belongs to.
    fn session(&self) -> SessionId;
}

/// The base contract every sequenced operation request satisfies.
pub trait Sequenced: SessionScoped {
    /// Position in the session's total order.
    fn sequence(&self) -> SequenceNumber;

    /// The serialized operation, opaque to this layer.
    fn payload(&self) -> &[u8];
}

/// Consistency demanded by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Read through the session's total order.
    #[default]
    Linearizable,
    /// Read from local state, ordered only per session.
    Sequential,
}

/// A state-mutating operation submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    header: OperationHeader,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

impl CommandRequest {
    /// Starts building a command request.
    #[must_use]
    pub fn builder() -> CommandRequestBuilder {
        CommandRequestBuilder::default()
    }
}

impl SessionScoped for CommandRequest {
    fn session(&self) -> SessionId {
        self.header.session
    }
}

impl Sequenced for CommandRequest {
    fn sequence(&self) -> SequenceNumber {
        self.header.sequence
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Single-use builder for [`CommandRequest`].
#[derive(Debug, Default)]
pub struct CommandRequestBuilder {
    session: Option<SessionId>,
    sequence: Option<SequenceNumber>,
    payload: Option<Vec<u8>>,
}

impl CommandRequestBuilder {
    /// Sets the session id.
    #[must_use]
    pub fn session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the sequence number.
    #[must_use]
    pub fn sequence(mut self, sequence: SequenceNumber) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Sets the serialized operation.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Validates every required field and produces the immutable request.
    pub fn build(self) -> Result<CommandRequest, RequestError> {
        let header = OperationHeader::try_new(self.session, self.sequence)?;
        let payload = self.payload.ok_or(RequestError::MissingPayload)?;
        Ok(CommandRequest { header, payload })
    }
}

/// A read-only operation submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    header: OperationHeader,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
    consistency: ConsistencyLevel,
}

impl QueryRequest {
    /// Starts building a query request.
    #[must_use]
    pub fn builder() -> QueryRequestBuilder {
        QueryRequestBuilder::default()
    }

    /// Consistency level demanded by this query.
    pub fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }
}

impl SessionScoped for QueryRequest {
    fn session(&self) -> SessionId {
        self.header.session
    }
}

impl Sequenced for QueryRequest {
    fn sequence(&self) -> SequenceNumber {
        self.header.sequence
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Single-use builder for [`QueryRequest`].
#[derive(Debug, Default)]
pub struct QueryRequestBuilder {
    session: Option<SessionId>,
    sequence: Option<SequenceNumber>,
    payload: Option<Vec<u8>>,
    consistency: ConsistencyLevel,
}

impl QueryRequestBuilder {
    /// Sets the session id.
    #[must_use]
    pub fn session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the sequence number.
    #[must_use]
    pub fn sequence(mut self, sequence: SequenceNumber) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Sets the serialized operation.
    #[must_use]
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Sets the consistency level; defaults to linearizable.
    #[must_use]
    pub fn consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }

    /// Validates every required field and produces the immutable request.
    pub fn build(self) -> Result<QueryRequest, RequestError> {
        let header = OperationHeader::try_new(self.session, self.sequence)?;
        let payload = self.payload.ok_or(RequestError::MissingPayload)?;
        Ok(QueryRequest {
            header,
            payload,
            consistency: self.consistency,
        })
    }
}
