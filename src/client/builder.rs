//! Client builder for constructing A2A clients with composable layers

use std::{sync::Arc, time::Duration};

use tower::{util::BoxCloneService, Layer};
use url::Url;

use crate::{
    client::{config::DEFAULT_TIMEOUT, AgentClient, ClientConfig},
    codec::{Codec, JsonRpcCodec},
    layer::{A2AValidationLayer, AuthCredentials, AuthLayer},
    protocol::error::A2AError,
    service::{A2AProtocolService, A2ARequest, A2AResponse},
    transport::{HttpTransport, Transport},
};

/// Type-erased service stack produced by [`A2AClientBuilder::build`]
pub type A2AService = BoxCloneService<A2ARequest, A2AResponse, A2AError>;

/// Builder for constructing A2A clients
///
/// Assembles the protocol service with the optional auth and validation
/// layers around it.
///
/// # Example
///
/// ```rust,no_run
/// use a2a_orchestrator::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), A2AError> {
/// let url = "http://localhost:10000".parse().unwrap();
/// let mut client = A2AClientBuilder::new_http(url)
///     .with_bearer_auth("token123")
///     .with_timeout(Duration::from_secs(60))
///     .build()?;
///
/// let agent_card = client.discover().await?;
/// println!("Connected to: {}", agent_card.name);
/// # Ok(())
/// # }
/// ```
pub struct A2AClientBuilder<T: Transport> {
    agent_url: Url,
    transport: Option<T>,
    codec: Option<Arc<dyn Codec>>,
    auth: Option<AuthCredentials>,
    timeout: Duration,
    max_retries: u32,
    validate_responses: bool,
}

impl<T: Transport> A2AClientBuilder<T> {
    /// Start a builder for `agent_url`; a transport must be supplied with
    /// [`with_transport`](Self::with_transport)
    pub fn new(agent_url: Url) -> Self {
        Self {
            agent_url,
            transport: None,
            codec: None,
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
            validate_responses: true,
        }
    }

    /// Use a custom transport
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Enable bearer token authentication
    pub fn with_bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthCredentials::bearer(token));
        self
    }

    /// Set custom authentication credentials
    pub fn with_auth(mut self, credentials: AuthCredentials) -> Self {
        self.auth = Some(credentials);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retry attempts for idempotent operations
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable or disable request and response validation
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Build the A2A client
    ///
    /// # Errors
    ///
    /// Returns a protocol error if no transport has been configured.
    pub fn build(self) -> Result<AgentClient<A2AService>, A2AError> {
        let transport = self.transport.ok_or_else(|| {
            A2AError::Protocol(
                "Transport not configured. Call new_http() or with_transport()".into(),
            )
        })?;

        let codec = self.codec.unwrap_or_else(|| Arc::new(JsonRpcCodec));

        let mut service = BoxCloneService::new(A2AProtocolService::new(transport, codec));

        if let Some(credentials) = self.auth {
            service = BoxCloneService::new(AuthLayer::new(credentials).layer(service));
        }

        if self.validate_responses {
            service = BoxCloneService::new(A2AValidationLayer::new().layer(service));
        }

        let config = ClientConfig::new(self.agent_url)
            .with_timeout(self.timeout)
            .with_max_retries(self.max_retries)
            .with_validation(self.validate_responses);

        Ok(AgentClient::new(service, config))
    }
}

impl A2AClientBuilder<HttpTransport> {
    /// Create a new client builder with HTTP transport and the JSON-RPC codec
    ///
    /// # Arguments
    ///
    /// * `agent_url` - The base URL of the agent (e.g., "<http://localhost:10000>")
    pub fn new_http(agent_url: Url) -> Self {
        let transport = HttpTransport::new(agent_url.clone());
        Self::new(agent_url)
            .with_transport(transport)
            .with_codec(Arc::new(JsonRpcCodec))
    }
}
