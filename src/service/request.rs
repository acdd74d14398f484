//! Requests flowing through the service stack

use std::{collections::HashMap, time::Duration};

use crate::{
    client::ClientConfig, layer::auth::AuthCredentials, protocol::operation::A2AOperation,
};

/// An operation plus the per-call settings the stack needs to run it
#[derive(Debug, Clone)]
pub struct A2ARequest {
    pub operation: A2AOperation,
    pub context: RequestContext,
}

impl A2ARequest {
    pub fn new(operation: A2AOperation, context: RequestContext) -> Self {
        Self { operation, context }
    }

    /// Request decoded by the server: no target, credentials or deadline
    pub fn inbound(operation: A2AOperation) -> Self {
        Self::new(operation, RequestContext::default())
    }
}

/// Per-call settings
///
/// Outbound calls get theirs from the client's [`ClientConfig`]; the auth
/// layer fills in `auth` when it is unset.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub auth: Option<AuthCredentials>,

    /// Deadline for the whole exchange
    pub timeout: Option<Duration>,

    /// Extra HTTP headers
    pub headers: HashMap<String, String>,
}

impl RequestContext {
    /// Context for a call made with `config`
    ///
    /// The target agent is fixed by the transport, so only the deadline
    /// comes from the config.
    pub fn for_client(config: &ClientConfig) -> Self {
        Self::default().with_timeout(config.timeout)
    }

    pub fn with_auth(mut self, auth: AuthCredentials) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
