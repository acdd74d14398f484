//! Connections to child agents

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::{
    client::{config::DEFAULT_TIMEOUT, A2AClientBuilder, A2AService, AgentClient},
    discovery::DiscoveredAgent,
    layer::AuthCredentials,
    protocol::{
        agent::AgentCard,
        error::A2AError,
        message::Message,
        task::{Task, TaskQueryParams, TaskSendParams},
    },
};

fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Sends tasks to one remote agent
pub struct AgentConnector {
    name: String,
    url: String,
    client: Mutex<AgentClient<A2AService>>,
}

impl std::fmt::Debug for AgentConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConnector")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

impl AgentConnector {
    /// Connector for the agent at `url`
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self, A2AError> {
        Self::with_options(name, url, None, DEFAULT_TIMEOUT)
    }

    /// Connector for a discovered agent, reusing its registry credentials
    pub fn for_agent(agent: &DiscoveredAgent, timeout: Duration) -> Result<Self, A2AError> {
        Self::with_options(
            agent.card.name.clone(),
            &agent.card.url,
            agent.entry.credentials(),
            timeout,
        )
    }

    /// Connector with optional credentials and a request deadline
    pub fn with_options(
        name: impl Into<String>,
        url: &str,
        credentials: Option<AuthCredentials>,
        timeout: Duration,
    ) -> Result<Self, A2AError> {
        let parsed = Url::parse(url)
            .map_err(|e| A2AError::Validation(format!("Invalid agent URL '{}': {}", url, e)))?;

        let mut builder = A2AClientBuilder::new_http(parsed).with_timeout(timeout);
        if let Some(credentials) = credentials {
            builder = builder.with_auth(credentials);
        }

        Ok(Self {
            name: name.into(),
            url: url.to_string(),
            client: Mutex::new(builder.build()?),
        })
    }

    /// Connector over an existing client
    pub fn from_client(name: impl Into<String>, client: AgentClient<A2AService>) -> Self {
        Self {
            name: name.into(),
            url: client.config().agent_url.clone(),
            client: Mutex::new(client),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // Each call works on its own clone of the service stack
    fn client(&self) -> AgentClient<A2AService> {
        match self.client.lock() {
            Ok(client) => client.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Send `text` as a new task within `session_id`
    ///
    /// # Errors
    ///
    /// `A2AError::Rpc` when the agent answers with an error envelope,
    /// `A2AError::Transport` or `A2AError::Timeout` when it cannot be reached.
    pub async fn send_task(&self, text: &str, session_id: &str) -> Result<Task, A2AError> {
        let message = Message::user(text).with_metadata(
            "messageId",
            serde_json::Value::String(fresh_id()),
        );
        let params = TaskSendParams::new(fresh_id(), message).with_session_id(session_id);

        debug!(agent = %self.name, task_id = %params.id, "delegating task");
        self.client().send_task(params).await
    }

    /// Fetch a task previously sent through this connector
    pub async fn get_task(
        &self,
        task_id: &str,
        history_length: Option<usize>,
    ) -> Result<Task, A2AError> {
        let mut params = TaskQueryParams::new(task_id);
        params.history_length = history_length;
        self.client().get_task(params).await
    }

    /// The agent's current card
    pub async fn agent_card(&self) -> Result<AgentCard, A2AError> {
        self.client().discover().await
    }
}

/// Connectors keyed by agent name, created on first use
pub struct ConnectorCache {
    timeout: Duration,
    connectors: Mutex<HashMap<String, Arc<AgentConnector>>>,
}

impl Default for ConnectorCache {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ConnectorCache {
    /// Cache whose connectors use `timeout` for every request
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            connectors: Mutex::new(HashMap::new()),
        }
    }

    /// Connector for `agent`, created on first use
    ///
    /// A cached connector whose URL no longer matches the card is replaced.
    pub fn get_or_create(&self, agent: &DiscoveredAgent) -> Result<Arc<AgentConnector>, A2AError> {
        let mut connectors = self
            .connectors
            .lock()
            .map_err(|_| A2AError::Other("connector cache lock poisoned".into()))?;

        if let Some(existing) = connectors.get(&agent.card.name) {
            if existing.url() == agent.card.url {
                return Ok(existing.clone());
            }
        }

        let connector = Arc::new(AgentConnector::for_agent(agent, self.timeout)?);
        connectors.insert(agent.card.name.clone(), connector.clone());
        Ok(connector)
    }

    pub fn len(&self) -> usize {
        self.connectors.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
