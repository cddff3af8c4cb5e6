//! # Sequin Protocol - sequenced session requests
//!
//! The request-sequencing half of the client/server protocol: session-scoped
//! operation requests tagged with strictly increasing per-session sequence
//! numbers, the builders that construct them, and the server-side admission
//! logic that turns an out-of-order arrival stream back into the order the
//! client issued.
//!
//! ## Modules
//!
//! - **types**: [`SessionId`], [`SequenceNumber`], and the client-side
//!   [`SequenceAssigner`]
//! - **request**: the [`CommandRequest`]/[`QueryRequest`] family and the
//!   shared [`Sequenced`] contract
//! - **admission**: [`SequenceBuffer`] (duplicate/gap handling) and
//!   [`ReplayCache`] (idempotent replay)
//! - **wire**: codec helpers at the transport boundary
//! - **error**: construction and sequencing failures

pub mod admission;
pub mod error;
pub mod request;
pub mod types;
pub mod wire;

pub use admission::{Admission, ReplayCache, SequenceBuffer};
pub use error::{RequestError, SequenceError};
pub use request::{
    CommandRequest, CommandRequestBuilder, ConsistencyLevel, OperationHeader, QueryRequest,
    QueryRequestBuilder, Sequenced, SessionHeader, SessionScoped,
};
pub use types::{SequenceAssigner, SequenceNumber, SessionId};
