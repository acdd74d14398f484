//! Error types for A2A protocol operations

use serde_json::Value;
use thiserror::Error;

use crate::codec::jsonrpc::{error_codes, JsonRpcError};

use super::task::TaskState;

/// Main error type for A2A protocol operations
#[derive(Debug, Error)]
pub enum A2AError {
    /// Transport-level error (network, connection, non-2xx status, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed envelope, unexpected response shape, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Validation error (unknown method, params not matching the method schema, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication or authorization error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Error envelope returned by a remote agent
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request timeout error
    #[error("Request timeout")]
    Timeout,

    /// Task not found error
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// A status change the task lifecycle does not allow
    #[error("Task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskState,
        to: TaskState,
    },

    /// No registered agent matches the requested name
    #[error("Agent not found: {name}")]
    AgentNotFound { name: String },

    /// Operation the server deliberately does not implement
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl A2AError {
    /// Application errors are answered with HTTP 200 and an error envelope;
    /// everything else is a failed request (HTTP 400).
    pub fn is_application_error(&self) -> bool {
        matches!(
            self,
            A2AError::TaskNotFound { .. }
                | A2AError::Unsupported(_)
                | A2AError::InvalidTransition { .. }
        )
    }

    /// Whether the error means the remote agent could not be reached
    pub fn is_unreachable(&self) -> bool {
        matches!(self, A2AError::Transport(_) | A2AError::Timeout)
    }

    /// JSON-RPC error object for this error
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            A2AError::TaskNotFound { task_id } => {
                JsonRpcError::new(error_codes::TASK_NOT_FOUND, "Task not found")
                    .with_data(serde_json::json!({ "id": task_id }))
            }
            A2AError::Unsupported(_) => JsonRpcError::new(
                error_codes::UNSUPPORTED_OPERATION,
                "This operation is not supported",
            ),
            A2AError::InvalidTransition { .. } => {
                JsonRpcError::new(error_codes::INVALID_TRANSITION, self.to_string())
            }
            A2AError::Rpc {
                code,
                message,
                data,
            } => JsonRpcError {
                code: *code,
                message: message.clone(),
                data: data.clone(),
            },
            other => JsonRpcError::internal(other.to_string()),
        }
    }
}

impl From<JsonRpcError> for A2AError {
    fn from(err: JsonRpcError) -> Self {
        A2AError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<reqwest::Error> for A2AError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            A2AError::Timeout
        } else if err.is_connect() {
            A2AError::Transport(format!("Connection error: {}", err))
        } else {
            A2AError::Transport(err.to_string())
        }
    }
}

impl From<&str> for A2AError {
    fn from(s: &str) -> Self {
        A2AError::Other(s.to_string())
    }
}

impl From<String> for A2AError {
    fn from(s: String) -> Self {
        A2AError::Other(s)
    }
}
