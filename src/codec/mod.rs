//! Serialization codecs for protocol bindings

pub mod jsonrpc;

pub use jsonrpc::{JsonRpcCodec, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};

use crate::{
    protocol::{error::A2AError, operation::A2AOperation},
    service::response::A2AResponse,
};
use bytes::Bytes;

/// Codec trait for encoding and decoding A2A protocol messages
///
/// The client side encodes operations and decodes responses; the server side
/// decodes incoming envelopes and encodes replies.
pub trait Codec: Send + Sync {
    /// Serialize an A2A operation to bytes for transport
    fn encode_request(&self, operation: &A2AOperation) -> Result<Bytes, A2AError>;

    /// Deserialize transport response bytes to an A2A response
    ///
    /// # Arguments
    ///
    /// * `body` - The response body bytes
    /// * `operation` - The original operation (for context)
    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError>;

    /// Parse an incoming request body into an envelope
    fn decode_request(&self, body: &[u8]) -> Result<JsonRpcRequest, A2AError>;

    /// Serialize an outgoing response envelope
    fn encode_response(&self, response: &JsonRpcResponse) -> Result<Bytes, A2AError>;

    /// Get the content type for this codec
    fn content_type(&self) -> &str;
}
