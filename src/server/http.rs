//! HTTP front for a task manager
//!
//! `POST /` takes JSON-RPC envelopes, `GET /.well-known/agent.json` serves
//! the agent card. The server keeps no state of its own.

use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::{debug, error, info, warn};

use crate::{
    codec::{Codec, JsonRpcCodec, JsonRpcResponse, RequestId},
    layer::A2AValidationLayer,
    protocol::{
        agent::AgentCard, error::A2AError, operation::A2AOperation, AGENT_CARD_PATH,
    },
    server::manager::TaskManager,
    service::{A2ARequest, A2AResponse},
};

/// Tower service answering A2A operations from a task manager
///
/// The HTTP handlers decode envelopes and hand the typed operation to this
/// service behind an [`A2AValidationLayer`].
#[derive(Clone)]
pub struct TaskService {
    manager: Arc<dyn TaskManager>,
    card: Arc<AgentCard>,
}

impl TaskService {
    pub fn new(manager: Arc<dyn TaskManager>, card: Arc<AgentCard>) -> Self {
        Self { manager, card }
    }
}

impl Service<A2ARequest> for TaskService {
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        let manager = self.manager.clone();
        let card = self.card.clone();

        Box::pin(async move {
            let task = match req.operation {
                A2AOperation::SendTask(params) => manager.on_send_task(params).await?,
                A2AOperation::GetTask(params) => manager.on_get_task(params).await?,
                A2AOperation::CancelTask(params) => manager.on_cancel_task(params).await?,
                A2AOperation::DiscoverAgent => {
                    return Ok(A2AResponse::AgentCard(Box::new((*card).clone())))
                }
            };
            Ok(A2AResponse::Task(Box::new(task)))
        })
    }
}

#[derive(Clone)]
struct ServerState {
    service: TaskService,
    codec: Arc<dyn Codec>,
}

/// A2A server publishing one agent
pub struct A2AServer {
    card: AgentCard,
    manager: Arc<dyn TaskManager>,
    codec: Arc<dyn Codec>,
}

impl A2AServer {
    pub fn new(card: AgentCard, manager: Arc<dyn TaskManager>) -> Self {
        Self {
            card,
            manager,
            codec: Arc::new(JsonRpcCodec::new()),
        }
    }

    /// Card served at the well-known path
    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Axum router exposing the JSON-RPC endpoint and the agent card
    pub fn router(&self) -> Router {
        let state = ServerState {
            service: TaskService::new(self.manager.clone(), Arc::new(self.card.clone())),
            codec: self.codec.clone(),
        };

        Router::new()
            .route("/", post(handle_rpc))
            .route(AGENT_CARD_PATH, get(handle_agent_card))
            .with_state(state)
    }

    /// Serve on an already bound listener until the process is stopped
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<(), A2AError> {
        let addr = listener
            .local_addr()
            .map_err(|e| A2AError::Transport(e.to_string()))?;
        info!(agent = %self.card.name, %addr, "A2A server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| A2AError::Transport(format!("Server error: {}", e)))
    }

    /// Bind `addr` and serve
    pub async fn serve(self, addr: SocketAddr) -> Result<(), A2AError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| A2AError::Transport(format!("Failed to bind {}: {}", addr, e)))?;
        self.serve_with_listener(listener).await
    }
}

fn envelope(codec: &dyn Codec, status: StatusCode, response: JsonRpcResponse) -> Response {
    match codec.encode_response(&response) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, codec.content_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn failure(codec: &dyn Codec, id: Option<RequestId>, err: &A2AError) -> Response {
    let status = if err.is_application_error() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    envelope(codec, status, JsonRpcResponse::failure(id, err.to_rpc_error()))
}

/// Best-effort id of a body that failed to decode as an envelope
fn salvage_id(body: &[u8]) -> Option<RequestId> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    serde_json::from_value(value.get("id")?.clone()).ok()
}

async fn handle_rpc(State(state): State<ServerState>, body: Bytes) -> Response {
    let codec = state.codec.as_ref();

    let request = match codec.decode_request(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejected JSON-RPC request");
            return failure(codec, salvage_id(&body), &e);
        }
    };

    let id = request.id.clone();
    debug!(method = %request.method, id = ?id, "received JSON-RPC request");

    let operation = match request.operation() {
        Ok(operation) => operation,
        Err(e) => {
            warn!(method = %request.method, error = %e, "rejected JSON-RPC request");
            return failure(codec, id, &e);
        }
    };

    let service = A2AValidationLayer::requests_only().layer(state.service.clone());
    match service.oneshot(A2ARequest::inbound(operation)).await {
        Ok(A2AResponse::Task(task)) => match serde_json::to_value(&task) {
            Ok(result) => envelope(codec, StatusCode::OK, JsonRpcResponse::success(id, result)),
            Err(e) => failure(codec, id, &A2AError::from(e)),
        },
        Ok(other) => {
            let err = A2AError::Protocol(format!("Unexpected handler response: {:?}", other));
            failure(codec, id, &err)
        }
        Err(e) => {
            if e.is_application_error() {
                debug!(error = %e, "application error");
            } else {
                error!(error = %e, "request failed");
            }
            failure(codec, id, &e)
        }
    }
}

async fn handle_agent_card(State(state): State<ServerState>) -> Response {
    match state
        .service
        .clone()
        .oneshot(A2ARequest::inbound(A2AOperation::DiscoverAgent))
        .await
    {
        Ok(A2AResponse::AgentCard(card)) => Json(*card).into_response(),
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
