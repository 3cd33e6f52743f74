//! Serialization and deserialization for the `TaskDeck` wire protocol.
//!
//! The document store speaks JSON text frames over WebSocket, so the codec
//! produces and consumes JSON strings. Frame boundaries come from the
//! transport; no length prefixing is needed here.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::gateway::{GatewayRequest, GatewayResponse};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a [`GatewayRequest`] as a JSON text frame.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the request cannot be serialized.
pub fn encode_request(request: &GatewayRequest) -> Result<String, CodecError> {
    to_json(request)
}

/// Decodes a [`GatewayRequest`] from a JSON text frame.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a valid request.
pub fn decode_request(text: &str) -> Result<GatewayRequest, CodecError> {
    from_json(text)
}

/// Encodes a [`GatewayResponse`] as a JSON text frame.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the response cannot be serialized.
pub fn encode_response(response: &GatewayResponse) -> Result<String, CodecError> {
    to_json(response)
}

/// Decodes a [`GatewayResponse`] from a JSON text frame.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a valid response.
pub fn decode_response(text: &str) -> Result<GatewayResponse, CodecError> {
    from_json(text)
}
