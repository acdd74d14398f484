//! Core A2A protocol types and definitions

pub mod agent;
pub mod error;
pub mod message;
pub mod operation;
pub mod task;

pub use agent::{AgentCapabilities, AgentCard, AgentProvider, AgentSkill};
pub use error::A2AError;
pub use message::{Message, Part, Role};
pub use operation::{methods, A2AOperation, AGENT_CARD_PATH};
pub use task::{Task, TaskIdParams, TaskQueryParams, TaskSendParams, TaskState, TaskStatus};
