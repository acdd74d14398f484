//! Validation layer for A2A protocol requests and responses
//!
//! Used on both sides of the wire: clients check what they send and what
//! agents return, the server checks decoded requests before they reach the
//! task manager.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;

use crate::{
    protocol::{error::A2AError, message::Message, operation::A2AOperation, task::Task},
    service::{A2ARequest, A2AResponse},
};

/// Layer that validates A2A protocol requests and responses
#[derive(Clone, Debug)]
pub struct A2AValidationLayer {
    check_responses: bool,
}

impl A2AValidationLayer {
    /// Create a validation layer that checks both directions
    pub fn new() -> Self {
        Self {
            check_responses: true,
        }
    }

    /// Create a validation layer that only checks requests
    ///
    /// Servers use this: the task manager has already committed its state
    /// by the time a response exists, so rejecting it would only hide the
    /// result from the caller.
    pub fn requests_only() -> Self {
        Self {
            check_responses: false,
        }
    }
}

impl Default for A2AValidationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for A2AValidationLayer {
    type Service = A2AValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        A2AValidationService {
            inner,
            check_responses: self.check_responses,
        }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone)]
pub struct A2AValidationService<S> {
    inner: S,
    check_responses: bool,
}

fn require_task_id(id: &str) -> Result<(), A2AError> {
    if id.trim().is_empty() {
        return Err(A2AError::Validation("Task ID cannot be empty".into()));
    }
    Ok(())
}

fn validate_message(message: &Message) -> Result<(), A2AError> {
    if message.parts.is_empty() {
        return Err(A2AError::Validation(
            "Message must have at least one part".into(),
        ));
    }

    for part in &message.parts {
        if part.as_text().is_some_and(str::is_empty) {
            return Err(A2AError::Validation("Text part cannot be empty".into()));
        }
    }

    Ok(())
}

fn validate_task(task: &Task, history_length: Option<usize>) -> Result<(), A2AError> {
    require_task_id(&task.id)?;

    // A task is created by its first message; historyLength 0 asks for none of it
    if task.history.is_empty() && history_length != Some(0) {
        return Err(A2AError::Validation(format!(
            "Task {} has an empty history",
            task.id
        )));
    }

    Ok(())
}

impl<S> A2AValidationService<S> {
    /// Validate an A2A request
    fn validate_request(req: &A2ARequest) -> Result<(), A2AError> {
        match &req.operation {
            A2AOperation::SendTask(params) => {
                require_task_id(&params.id)?;
                validate_message(&params.message)
            }
            A2AOperation::GetTask(params) => require_task_id(&params.id),
            A2AOperation::CancelTask(params) => require_task_id(&params.id),
            A2AOperation::DiscoverAgent => Ok(()),
        }
    }

    /// History length the caller asked for, if the operation carries one
    fn requested_history(req: &A2ARequest) -> Option<usize> {
        match &req.operation {
            A2AOperation::SendTask(params) => params.history_length,
            A2AOperation::GetTask(params) => params.history_length,
            A2AOperation::CancelTask(_) | A2AOperation::DiscoverAgent => None,
        }
    }

    /// Validate an A2A response
    fn validate_response(
        resp: &A2AResponse,
        history_length: Option<usize>,
    ) -> Result<(), A2AError> {
        match resp {
            A2AResponse::Task(task) => validate_task(task, history_length),
            A2AResponse::AgentCard(card) => {
                if card.name.is_empty() {
                    return Err(A2AError::Validation("Agent name cannot be empty".into()));
                }
                if card.url.is_empty() {
                    return Err(A2AError::Validation("Agent URL cannot be empty".into()));
                }
                Ok(())
            }
            A2AResponse::Empty => Ok(()),
        }
    }
}

impl<S> Service<A2ARequest> for A2AValidationService<S>
where
    S: Service<A2ARequest, Response = A2AResponse, Error = A2AError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = A2AResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: A2ARequest) -> Self::Future {
        if let Err(e) = Self::validate_request(&req) {
            return Box::pin(async move { Err(e) });
        }

        let mut inner = self.inner.clone();
        if !self.check_responses {
            return Box::pin(async move { inner.call(req).await });
        }

        let history_length = Self::requested_history(&req);
        Box::pin(async move {
            let response = inner.call(req).await?;
            Self::validate_response(&response, history_length)?;
            Ok(response)
        })
    }
}
