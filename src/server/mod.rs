//! Serving side of the protocol: task storage, task handlers and the HTTP front

pub mod http;
pub mod manager;
pub mod store;

pub use http::{A2AServer, TaskService};
pub use manager::{InMemoryTaskManager, Responder, TaskManager};
pub use store::{InMemoryTaskStore, TaskStore, TaskUpdate};
