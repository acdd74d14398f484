//! # A2A Orchestrator
//!
//! A small multi-agent system speaking the Agent2Agent (A2A) protocol:
//! JSON-RPC 2.0 over HTTP, with tasks that carry an append-only message
//! history.
//!
//! The crate is layered the way requests flow:
//!
//! - [`protocol`]: messages, tasks, agent cards and the typed operations
//! - [`codec`]: the JSON-RPC envelope
//! - [`transport`], [`service`], [`layer`], [`client`]: the Tower client stack
//! - [`server`]: task storage, task handlers and the axum HTTP front
//! - [`discovery`]: agent registry and card probing
//! - [`connector`]: per-agent clients used for delegation
//! - [`orchestrator`]: choosing a child agent and delegating to it
//! - [`agents`]: the demo time, greeting and host agents
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_orchestrator::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), A2AError> {
//!     let url = "http://localhost:10000".parse().unwrap();
//!     let mut client = A2AClientBuilder::new_http(url).build()?;
//!
//!     let agent_card = client.discover().await?;
//!     println!("Connected to: {}", agent_card.name);
//!
//!     let params = TaskSendParams::new("task-1", Message::user("What time is it?"));
//!     let task = client.send_task(params).await?;
//!     if let Some(reply) = task.last_agent_message() {
//!         println!("{}", reply.text());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod client;
pub mod codec;
pub mod connector;
pub mod discovery;
pub mod layer;
pub mod orchestrator;
pub mod protocol;
pub mod server;
pub mod service;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{A2AClientBuilder, AgentClient},
        connector::{AgentConnector, ConnectorCache},
        discovery::{AgentDirectory, DiscoveryClient, DiscoveryConfig},
        orchestrator::{KeywordPolicy, Orchestrator, RoutingPolicy},
        protocol::error::A2AError,
        protocol::{
            AgentCard, Message, Part, Role, Task, TaskQueryParams, TaskSendParams, TaskState,
        },
        server::{A2AServer, InMemoryTaskManager, Responder, TaskManager},
    };
}
