//! A2A protocol operations

use serde_json::Value;

use super::{
    error::A2AError,
    task::{TaskIdParams, TaskQueryParams, TaskSendParams},
};

/// JSON-RPC method names
pub mod methods {
    pub const SEND_TASK: &str = "tasks/send";
    pub const GET_TASK: &str = "tasks/get";
    pub const CANCEL_TASK: &str = "tasks/cancel";

    /// Every method the server dispatches
    pub const ALL: &[&str] = &[SEND_TASK, GET_TASK, CANCEL_TASK];
}

/// Path of the agent card relative to an agent's base URL
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// A2A protocol operations
///
/// Every JSON-RPC method maps to one variant carrying its typed params.
/// `DiscoverAgent` is the plain GET of the agent card and has no method name.
#[derive(Debug, Clone, PartialEq)]
pub enum A2AOperation {
    /// Send a message to a task, creating the task on first use
    SendTask(TaskSendParams),

    /// Get a task by ID
    GetTask(TaskQueryParams),

    /// Cancel a task
    CancelTask(TaskIdParams),

    /// Discover agent capabilities (fetch Agent Card)
    DiscoverAgent,
}

impl A2AOperation {
    /// Parse a JSON-RPC method and its params into a typed operation
    ///
    /// Unknown methods and params that do not match the method's schema are
    /// validation errors.
    pub fn from_rpc(method: &str, params: Value) -> Result<Self, A2AError> {
        let parsed = match method {
            methods::SEND_TASK => serde_json::from_value(params).map(A2AOperation::SendTask),
            methods::GET_TASK => serde_json::from_value(params).map(A2AOperation::GetTask),
            methods::CANCEL_TASK => serde_json::from_value(params).map(A2AOperation::CancelTask),
            other => {
                return Err(A2AError::Validation(format!(
                    "Unsupported method '{}', expected one of: {}",
                    other,
                    methods::ALL.join(", ")
                )))
            }
        };

        parsed.map_err(|e| A2AError::Validation(format!("Invalid params for {}: {}", method, e)))
    }

    /// JSON-RPC method name, `None` for agent discovery
    pub fn rpc_method(&self) -> Option<&'static str> {
        match self {
            A2AOperation::SendTask(_) => Some(methods::SEND_TASK),
            A2AOperation::GetTask(_) => Some(methods::GET_TASK),
            A2AOperation::CancelTask(_) => Some(methods::CANCEL_TASK),
            A2AOperation::DiscoverAgent => None,
        }
    }

    /// Serialized params for the JSON-RPC envelope
    pub fn params(&self) -> Result<Value, A2AError> {
        let value = match self {
            A2AOperation::SendTask(params) => serde_json::to_value(params)?,
            A2AOperation::GetTask(params) => serde_json::to_value(params)?,
            A2AOperation::CancelTask(params) => serde_json::to_value(params)?,
            A2AOperation::DiscoverAgent => Value::Null,
        };
        Ok(value)
    }

    /// Id of the task the operation addresses
    pub fn task_id(&self) -> Option<&str> {
        match self {
            A2AOperation::SendTask(p) => Some(&p.id),
            A2AOperation::GetTask(p) => Some(&p.id),
            A2AOperation::CancelTask(p) => Some(&p.id),
            A2AOperation::DiscoverAgent => None,
        }
    }

    /// Get the HTTP endpoint path for this operation
    pub fn endpoint(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => AGENT_CARD_PATH,
            _ => "/",
        }
    }

    /// Get the HTTP method for this operation
    pub fn method(&self) -> &'static str {
        match self {
            A2AOperation::DiscoverAgent => "GET",
            _ => "POST",
        }
    }
}
