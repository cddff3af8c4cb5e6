//! Wire codec seam.
//!
//! The transport owns the real on-wire layout; these helpers are the codec
//! boundary this crate exposes for tests and simple transports. Payloads
//! inside requests stay opaque bytes either way.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RequestError;

/// Serializes a protocol value to bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RequestError> {
    bincode::serialize(value).map_err(|err| RequestError::Codec {
        message: err.to_string(),
    })
}

/// Deserializes a protocol value from bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RequestError> {
    bincode::deserialize(bytes).map_err(|err| RequestError::Codec {
        message: err.to_string(),
    })
}
