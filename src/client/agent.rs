//! High-level A2A agent client

use std::time::Duration;

use tower::ServiceExt;
use tower_service::Service;
use tracing::warn;

use crate::{
    client::config::ClientConfig,
    protocol::{
        error::A2AError,
        operation::A2AOperation,
        task::{TaskIdParams, TaskQueryParams, TaskSendParams},
        AgentCard, Task,
    },
    service::{A2ARequest, A2AResponse, RequestContext},
};

/// Delay before the first retry, grows linearly with each attempt
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// High-level A2A client for interacting with agents
///
/// This client wraps a Tower service and provides one method per A2A
/// operation. The service is generic over anything that satisfies the
/// Service trait bounds; [`A2AClientBuilder`](crate::client::A2AClientBuilder)
/// produces the usual HTTP stack.
///
/// # Example
///
/// ```rust,no_run
/// use a2a_orchestrator::prelude::*;
///
/// # async fn example() -> Result<(), A2AError> {
/// let url = "http://localhost:10000".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url).build()?;
///
/// let params = TaskSendParams::new("task-1", Message::user("What time is it?"));
/// let task = client.send_task(params).await?;
/// println!("Task {} is {}", task.id, task.state());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentClient<S> {
    service: S,
    config: ClientConfig,
}

impl<S> AgentClient<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError>,
{
    /// Create a new agent client
    ///
    /// # Arguments
    ///
    /// * `service` - The Tower service that handles requests
    /// * `config` - Client configuration
    pub fn new(service: S, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn execute(&mut self, operation: A2AOperation) -> Result<A2AResponse, A2AError> {
        // Only reads are retried; a repeated send would append twice
        let retries = match operation {
            A2AOperation::GetTask(_) | A2AOperation::DiscoverAgent => self.config.max_retries,
            _ => 0,
        };

        let mut attempt: u32 = 0;
        loop {
            let context = RequestContext::for_client(&self.config);
            let request = A2ARequest::new(operation.clone(), context);
            let service = self.service.ready().await?;
            match service.call(request).await {
                Err(e) if e.is_unreachable() && attempt < retries => {
                    attempt += 1;
                    warn!(
                        agent = %self.config.agent_url,
                        attempt,
                        error = %e,
                        "agent unreachable, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                result => return result,
            }
        }
    }

    /// Send a message to a task, creating the task on first use
    ///
    /// # Errors
    ///
    /// Returns `A2AError::Rpc` when the agent answers with an error envelope
    /// and `A2AError::Transport`/`A2AError::Timeout` when it cannot be reached.
    pub async fn send_task(&mut self, params: TaskSendParams) -> Result<Task, A2AError> {
        self.execute(A2AOperation::SendTask(params))
            .await?
            .expect_task()
    }

    /// Get a task by ID, optionally truncating its history
    pub async fn get_task(&mut self, params: TaskQueryParams) -> Result<Task, A2AError> {
        self.execute(A2AOperation::GetTask(params))
            .await?
            .expect_task()
    }

    /// Ask the agent to cancel a task
    pub async fn cancel_task(&mut self, task_id: impl Into<String>) -> Result<Task, A2AError> {
        self.execute(A2AOperation::CancelTask(TaskIdParams::new(task_id)))
            .await?
            .expect_task()
    }

    /// Discover agent capabilities by fetching the Agent Card
    ///
    /// This retrieves the agent's metadata from `/.well-known/agent.json`
    pub async fn discover(&mut self) -> Result<AgentCard, A2AError> {
        self.execute(A2AOperation::DiscoverAgent)
            .await?
            .expect_agent_card()
    }
}
