//! Core A2A protocol service implementation

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;
use tracing::debug;

use crate::{
    codec::{Codec, JsonRpcResponse},
    protocol::{error::A2AError, operation::A2AOperation},
    service::{A2ARequest, A2AResponse},
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Core A2A protocol service that wraps a transport
///
/// Encodes each operation with the codec, hands the bytes to the transport
/// and decodes whatever comes back. Layers (auth, validation) wrap this
/// service.
pub struct A2AProtocolService<T> {
    transport: T,
    codec: Arc<dyn Codec>,
}

impl<T> A2AProtocolService<T>
where
    T: Transport,
{
    /// Create a new A2A protocol service
    ///
    /// # Arguments
    ///
    /// * `transport` - The underlying transport implementation
    /// * `codec` - The codec for serialization/deserialization
    pub fn new(transport: T, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    /// Build a transport request from an A2A operation
    fn build_transport_request(
        req: &A2ARequest,
        codec: &dyn Codec,
    ) -> Result<TransportRequest, A2AError> {
        let endpoint = req.operation.endpoint();
        let method = req.operation.method();

        let mut transport_req = TransportRequest::new(endpoint, method)
            .header("Accept", "application/json");

        if let Some(auth) = &req.context.auth {
            let (header, value) = auth.to_header();
            transport_req = transport_req.header(header, value);
        }

        for (key, value) in &req.context.headers {
            transport_req = transport_req.header(key.clone(), value.clone());
        }

        if let Some(timeout) = req.context.timeout {
            transport_req = transport_req.timeout(timeout);
        }

        let body = codec.encode_request(&req.operation)?;
        if !body.is_empty() && method != "GET" {
            transport_req = transport_req
                .header("Content-Type", codec.content_type())
                .body(body);
        }

        Ok(transport_req)
    }

    /// Parse a transport response into an A2A response
    fn parse_transport_response(
        transport_resp: TransportResponse,
        codec: &dyn Codec,
        operation: &A2AOperation,
    ) -> Result<A2AResponse, A2AError> {
        if !transport_resp.is_success() {
            return Err(Self::handle_error_response(&transport_resp));
        }

        codec.decode_response(&transport_resp.body, operation)
    }

    /// Handle error responses from the transport
    ///
    /// Servers answer bad requests with HTTP 400 and a JSON-RPC error
    /// envelope, so the envelope is preferred over the bare status.
    fn handle_error_response(transport_resp: &TransportResponse) -> A2AError {
        if let Ok(envelope) = serde_json::from_slice::<JsonRpcResponse>(&transport_resp.body) {
            if let Some(error) = envelope.error {
                return error.into();
            }
        }

        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&transport_resp.body) {
            if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
                return match transport_resp.status {
                    401 | 403 => A2AError::Auth(message.to_string()),
                    _ => {
                        A2AError::Transport(format!("HTTP {}: {}", transport_resp.status, message))
                    }
                };
            }
        }

        match transport_resp.status {
            401 | 403 => A2AError::Auth(format!("HTTP {}", transport_resp.status)),
            status => A2AError::Transport(format!("HTTP error: {}", status)),
        }
    }
}

impl<T> Service<A2ARequest> for A2AProtocolService<T>
where
    T: Transport + Clone,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        let transport = self.transport.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            let transport_req = Self::build_transport_request(&req, codec.as_ref())?;

            debug!(
                agent = %transport.base_url(),
                method = req.operation.rpc_method().unwrap_or("GET agent card"),
                "sending A2A request"
            );

            let transport_resp = transport.execute(transport_req).await?;

            Self::parse_transport_response(transport_resp, codec.as_ref(), &req.operation)
        })
    }
}

impl<T> Clone for A2AProtocolService<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
        }
    }
}
