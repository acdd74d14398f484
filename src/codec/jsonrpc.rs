//! JSON-RPC 2.0 codec for A2A protocol
//!
//! Wraps A2A operations in JSON-RPC 2.0 envelopes on the client side and
//! unwraps incoming envelopes on the server side.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    codec::Codec,
    protocol::{agent::AgentCard, error::A2AError, operation::A2AOperation, task::Task},
    service::response::A2AResponse,
};

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes used by the A2A binding
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    /// Conventional code for unclassified failures
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const TASK_NOT_FOUND: i64 = -32001;
    pub const INVALID_TRANSITION: i64 = -32002;
    pub const UNSUPPORTED_OPERATION: i64 = -32004;
}

/// Request identifier: a string or a number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    /// Fresh opaque identifier
    pub fn generate() -> Self {
        RequestId::String(Uuid::now_v7().simple().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

fn generated_id() -> Option<RequestId> {
    Some(RequestId::generate())
}

/// JSON-RPC 2.0 request envelope
///
/// A missing `id` is replaced by a generated one; an explicit `null` stays `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default = "generated_id")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request with a generated id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: generated_id(),
            method: method.into(),
            params,
        }
    }

    /// Wrap an operation in an envelope
    pub fn from_operation(operation: &A2AOperation) -> Result<Self, A2AError> {
        let method = operation.rpc_method().ok_or_else(|| {
            A2AError::Protocol("Agent discovery is not a JSON-RPC method".to_string())
        })?;
        Ok(Self::new(method, operation.params()?))
    }

    /// Validate the params against the method's schema
    pub fn operation(&self) -> Result<A2AOperation, A2AError> {
        A2AOperation::from_rpc(&self.method, self.params.clone())
    }
}

/// JSON-RPC 2.0 response envelope
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response echoing `id`
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response echoing `id`
    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Unwrap the result, turning an error envelope into `A2AError::Rpc`
    pub fn into_result(self) -> Result<Value, A2AError> {
        if let Some(error) = self.error {
            return Err(error.into());
        }

        self.result.ok_or_else(|| {
            A2AError::Protocol("JSON-RPC response missing 'result' field".to_string())
        })
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Internal error (-32603) carrying `message`
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// JSON-RPC 2.0 codec for A2A operations
///
/// Agent discovery is a plain GET, so its response is decoded as a bare
/// agent card rather than an envelope.
#[derive(Debug, Clone, Default)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    /// Create a new JSON-RPC codec
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonRpcCodec {
    fn encode_request(&self, operation: &A2AOperation) -> Result<Bytes, A2AError> {
        if matches!(operation, A2AOperation::DiscoverAgent) {
            return Ok(Bytes::new());
        }

        let request = JsonRpcRequest::from_operation(operation)?;
        let bytes = serde_json::to_vec(&request)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_response(
        &self,
        body: &[u8],
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        // Empty responses
        if body.is_empty() {
            return Ok(A2AResponse::Empty);
        }

        if matches!(operation, A2AOperation::DiscoverAgent) {
            let card: AgentCard = serde_json::from_slice(body)
                .map_err(|e| A2AError::Protocol(format!("Failed to parse agent card: {}", e)))?;
            return Ok(A2AResponse::AgentCard(Box::new(card)));
        }

        let response: JsonRpcResponse = serde_json::from_slice(body).map_err(|e| {
            A2AError::Protocol(format!("Failed to parse JSON-RPC response: {}", e))
        })?;

        let result = response.into_result()?;
        let task: Task = serde_json::from_value(result)
            .map_err(|e| A2AError::Protocol(format!("Result is not a task: {}", e)))?;

        Ok(A2AResponse::Task(Box::new(task)))
    }

    fn decode_request(&self, body: &[u8]) -> Result<JsonRpcRequest, A2AError> {
        let request: JsonRpcRequest = serde_json::from_slice(body)
            .map_err(|e| A2AError::Validation(format!("Invalid JSON-RPC request: {}", e)))?;

        if request.jsonrpc != JSONRPC_VERSION {
            return Err(A2AError::Validation(format!(
                "Unsupported JSON-RPC version '{}'",
                request.jsonrpc
            )));
        }

        Ok(request)
    }

    fn encode_response(&self, response: &JsonRpcResponse) -> Result<Bytes, A2AError> {
        Ok(Bytes::from(serde_json::to_vec(response)?))
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::protocol::{
        message::Message,
        task::{TaskQueryParams, TaskSendParams},
    };

    use super::*;

    #[test]
    fn test_encode_send_task() {
        let codec = JsonRpcCodec::new();
        let operation = A2AOperation::SendTask(TaskSendParams::new("t1", Message::user("Hello")));

        let bytes = codec.encode_request(&operation).unwrap();

        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "tasks/send");
        assert_eq!(json["params"]["id"], "t1");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_discovery_has_no_body() {
        let codec = JsonRpcCodec::new();
        let bytes = codec.encode_request(&A2AOperation::DiscoverAgent).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_request_id_defaults() {
        let omitted: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "tasks/get"})).unwrap();
        assert!(omitted.id.is_some());

        let null: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "tasks/get"}))
                .unwrap();
        assert!(null.id.is_none());

        let number: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 7, "method": "tasks/get"}))
                .unwrap();
        assert_eq!(number.id, Some(RequestId::Number(7)));
    }

    #[test]
    fn test_decode_request_rejects_wrong_version() {
        let codec = JsonRpcCodec::new();
        let body = br#"{"jsonrpc":"1.0","id":1,"method":"tasks/get","params":{"id":"t"}}"#;
        assert!(matches!(
            codec.decode_request(body),
            Err(A2AError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_request_rejects_malformed_json() {
        let codec = JsonRpcCodec::new();
        assert!(matches!(
            codec.decode_request(b"{not json"),
            Err(A2AError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_success_response() {
        let codec = JsonRpcCodec::new();
        let json = r#"{
            "jsonrpc": "2.0",
            "result": {
                "id": "task-123",
                "status": {"state": "completed", "timestamp": "2024-01-01T00:00:00Z"},
                "history": [
                    {"role": "user", "parts": [{"type": "text", "text": "Hello"}]},
                    {"role": "agent", "parts": [{"type": "text", "text": "Hi"}]}
                ]
            },
            "id": "req-123"
        }"#;

        let operation = A2AOperation::GetTask(TaskQueryParams::new("task-123"));
        let response = codec.decode_response(json.as_bytes(), &operation).unwrap();

        let task = response.into_task().unwrap();
        assert_eq!(task.id, "task-123");
        assert_eq!(task.history.len(), 2);
    }

    #[test]
    fn test_decode_error_response() {
        let codec = JsonRpcCodec::new();
        let json = r#"{
            "jsonrpc": "2.0",
            "error": {"code": -32001, "message": "Task not found"},
            "id": "req-123"
        }"#;

        let operation = A2AOperation::GetTask(TaskQueryParams::new("task-123"));
        let result = codec.decode_response(json.as_bytes(), &operation);

        match result {
            Err(A2AError::Rpc { code, message, .. }) => {
                assert_eq!(code, -32001);
                assert_eq!(message, "Task not found");
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_result() {
        let codec = JsonRpcCodec::new();
        let json = r#"{"jsonrpc": "2.0", "id": "req-123"}"#;

        let operation = A2AOperation::GetTask(TaskQueryParams::new("task-123"));
        match codec.decode_response(json.as_bytes(), &operation) {
            Err(A2AError::Protocol(msg)) => assert!(msg.contains("missing 'result' field")),
            other => panic!("Expected Protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_envelope_shape() {
        let response = JsonRpcResponse::failure(None, JsonRpcError::internal("boom"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert!(json["id"].is_null());
        assert_eq!(json["error"]["code"], -32603);
        assert_eq!(json["error"]["message"], "boom");
        assert!(json.get("result").is_none());
    }
}
