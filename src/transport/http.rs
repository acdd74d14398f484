//! HTTP transport implementation for A2A protocol

use std::{
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use url::Url;

use crate::protocol::error::A2AError;

use super::{join_url, Transport, TransportRequest, TransportResponse};

/// HTTP transport implementation using reqwest
///
/// Posts JSON-RPC envelopes to the agent's base URL and fetches the agent
/// card with a plain GET.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the agent (e.g., "<http://localhost:10000>")
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a new HTTP transport with a custom reqwest client
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { client, base_url }
    }

    /// Create a transport whose client gives up after `timeout`
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, A2AError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| A2AError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), A2AError>> {
        // HTTP client is always ready
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, A2AError> {
        let url = join_url(self.base_url.as_str(), &request.endpoint);

        let mut req_builder = match request.method.as_str() {
            "POST" => self.client.post(&url),
            "GET" => self.client.get(&url),
            _ => {
                return Err(A2AError::Transport(format!(
                    "Unsupported HTTP method: {}",
                    request.method
                )))
            }
        };

        for (key, value) in request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(Url::parse("http://localhost:10000").unwrap());
        assert_eq!(transport.base_url().as_str(), "http://localhost:10000/");
    }

    #[test]
    fn test_http_transport_with_timeout() {
        let transport = HttpTransport::with_timeout(
            Url::parse("http://localhost:10002/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(transport.base_url().port(), Some(10002));
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to be listening
        let transport = HttpTransport::with_timeout(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = transport
            .execute(TransportRequest::new("/", "POST"))
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let transport = HttpTransport::new(Url::parse("http://127.0.0.1:9/").unwrap());
        let err = transport
            .execute(TransportRequest::new("/", "PATCH"))
            .await
            .unwrap_err();
        assert!(matches!(err, A2AError::Transport(_)));
    }
}
