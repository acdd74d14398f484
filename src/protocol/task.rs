//! A2A task types and lifecycle management

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{error::A2AError, message::Message};

/// A task in the A2A protocol
///
/// A task is a unit of delegated work identified by a caller-supplied id.
/// It carries its current status and an append-only message history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Caller-supplied identifier, unique within a task store
    pub id: String,

    /// Session the task was submitted under
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Current status of the task
    pub status: TaskStatus,

    /// Every message exchanged for this task, oldest first
    #[serde(default)]
    pub history: Vec<Message>,

    /// Optional metadata supplied with the first send
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Task {
    /// Create a freshly submitted task whose history holds the initial message
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: None,
            status: TaskStatus::new(TaskState::Submitted),
            history: vec![message],
            metadata: None,
        }
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the task metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.status.state
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Append a message to the history
    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Move the task to `state`, replacing its status
    ///
    /// Terminal states only accept a repeat of themselves.
    pub fn transition(&mut self, state: TaskState) -> Result<(), A2AError> {
        if !self.status.state.can_transition_to(state) {
            return Err(A2AError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status.state,
                to: state,
            });
        }
        self.status = TaskStatus::new(state);
        Ok(())
    }

    /// Copy of this task keeping only the last `history_length` messages
    pub fn truncated(&self, history_length: Option<usize>) -> Task {
        let mut copy = self.clone();
        if let Some(len) = history_length {
            let skip = copy.history.len().saturating_sub(len);
            copy.history.drain(..skip);
        }
        copy
    }

    /// Most recent message sent by the agent side
    pub fn last_agent_message(&self) -> Option<&Message> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == super::message::Role::Agent)
    }
}

/// Status of a task at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    /// Lifecycle state
    pub state: TaskState,

    /// When the task entered this state
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Create a status stamped with the current time
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
        }
    }
}

/// Task state in the A2A protocol lifecycle
///
/// Task lifecycle: submitted → working → completed/failed/canceled
/// Non-terminal: input-required (awaiting client input), unknown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received
    Submitted,

    /// Task is currently being processed
    Working,

    /// Task requires additional input from the client
    InputRequired,

    /// Task completed successfully
    Completed,

    /// Task was canceled
    Canceled,

    /// Task failed with an error
    Failed,

    /// State could not be determined
    Unknown,
}

impl TaskState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed
        )
    }

    /// Whether a task in this state may move to `next`
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        !self.is_terminal() || *self == next
    }

    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fresh_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Parameters of `tasks/send`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Task id, chosen by the caller
    pub id: String,

    /// Session grouping id, generated when omitted
    #[serde(default = "fresh_session_id")]
    pub session_id: String,

    /// The message to append
    pub message: Message,

    /// Limit on the history returned with the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,

    /// Free-form caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TaskSendParams {
    /// Create send parameters with a fresh session id
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: fresh_session_id(),
            message,
            history_length: None,
            metadata: None,
        }
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Set the history length limit
    pub fn with_history_length(mut self, history_length: usize) -> Self {
        self.history_length = Some(history_length);
        self
    }
}

/// Parameters of `tasks/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    /// Task id to look up
    pub id: String,

    /// Return only the last N history messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,

    /// Free-form caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TaskQueryParams {
    /// Query for the full history of a task
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history_length: None,
            metadata: None,
        }
    }

    /// Set the history length limit
    pub fn with_history_length(mut self, history_length: usize) -> Self {
        self.history_length = Some(history_length);
        self
    }
}

/// Parameters of operations addressing a task only by id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskIdParams {
    /// Task id
    pub id: String,

    /// Free-form caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TaskIdParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
        }
    }
}
