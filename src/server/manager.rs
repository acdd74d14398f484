//! Task manager: the handlers behind the JSON-RPC methods

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
    protocol::{
        error::A2AError,
        message::Message,
        task::{Task, TaskIdParams, TaskQueryParams, TaskSendParams, TaskState},
    },
    server::store::{InMemoryTaskStore, TaskStore, TaskUpdate},
};

/// Produces the agent's reply to a user message
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    /// Reply to `text` sent within `session_id`
    async fn respond(&self, text: &str, session_id: &str) -> Result<String, A2AError>;
}

/// Handlers for the task methods
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Create the task from `params.message`, or append the message to it
    async fn upsert_task(&self, params: &TaskSendParams) -> Result<Task, A2AError>;

    /// Record the message, obtain a reply and complete the task
    async fn on_send_task(&self, params: TaskSendParams) -> Result<Task, A2AError>;

    /// Copy of the task, history truncated to `params.history_length`
    async fn on_get_task(&self, params: TaskQueryParams) -> Result<Task, A2AError>;

    /// Always rejected
    async fn on_cancel_task(&self, params: TaskIdParams) -> Result<Task, A2AError>;
}

/// Task manager keeping tasks in a [`TaskStore`] and delegating replies to a
/// [`Responder`]
pub struct InMemoryTaskManager {
    store: Arc<dyn TaskStore>,
    responder: Arc<dyn Responder>,
}

impl InMemoryTaskManager {
    /// Manager backed by a fresh in-memory store
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self::with_store(Arc::new(InMemoryTaskStore::new()), responder)
    }

    pub fn with_store(store: Arc<dyn TaskStore>, responder: Arc<dyn Responder>) -> Self {
        Self { store, responder }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }
}

#[async_trait]
impl TaskManager for InMemoryTaskManager {
    async fn upsert_task(&self, params: &TaskSendParams) -> Result<Task, A2AError> {
        self.store
            .upsert(
                &params.id,
                TaskUpdate::Submit {
                    message: params.message.clone(),
                    session_id: params.session_id.clone(),
                    metadata: params.metadata.clone(),
                },
            )
            .await
    }

    async fn on_send_task(&self, params: TaskSendParams) -> Result<Task, A2AError> {
        let task = self.upsert_task(&params).await?;
        info!(task_id = %task.id, session_id = %params.session_id, "task received");

        let text = params.message.text();
        let reply = match self.responder.respond(&text, &params.session_id).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(task_id = %params.id, error = %e, "responder failed");
                if let Err(mark) = self
                    .store
                    .upsert(&params.id, TaskUpdate::Status(TaskState::Failed))
                    .await
                {
                    warn!(task_id = %params.id, error = %mark, "could not mark task failed");
                }
                return Err(e);
            }
        };

        let task = self
            .store
            .upsert(
                &params.id,
                TaskUpdate::Reply {
                    message: Message::agent(reply),
                    state: TaskState::Completed,
                },
            )
            .await?;

        info!(task_id = %task.id, state = %task.state(), "task answered");
        Ok(task.truncated(params.history_length))
    }

    async fn on_get_task(&self, params: TaskQueryParams) -> Result<Task, A2AError> {
        let task = self
            .store
            .get(&params.id)
            .await
            .ok_or_else(|| A2AError::TaskNotFound {
                task_id: params.id.clone(),
            })?;

        Ok(task.truncated(params.history_length))
    }

    async fn on_cancel_task(&self, params: TaskIdParams) -> Result<Task, A2AError> {
        Err(A2AError::Unsupported(format!(
            "tasks/cancel for task {}",
            params.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;

    fn manager(responder: MockResponder) -> InMemoryTaskManager {
        InMemoryTaskManager::new(Arc::new(responder))
    }

    #[tokio::test]
    async fn test_send_task_completes_with_reply() {
        let mut responder = MockResponder::new();
        responder
            .expect_respond()
            .with(eq("What time is it?"), eq("s1"))
            .times(1)
            .returning(|_, _| Ok("It is noon".to_string()));

        let manager = manager(responder);
        let params =
            TaskSendParams::new("t1", Message::user("What time is it?")).with_session_id("s1");

        let task = manager.on_send_task(params).await.unwrap();

        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[0].text(), "What time is it?");
        assert_eq!(task.history[1].text(), "It is noon");
    }

    #[tokio::test]
    async fn test_send_task_responder_failure_marks_failed() {
        let mut responder = MockResponder::new();
        responder
            .expect_respond()
            .returning(|_, _| Err(A2AError::Other("model offline".into())));

        let manager = manager(responder);
        let params = TaskSendParams::new("t1", Message::user("hello"));

        let err = manager.on_send_task(params).await.unwrap_err();
        assert_eq!(err.to_string(), "model offline");

        let task = manager
            .on_get_task(TaskQueryParams::new("t1"))
            .await
            .unwrap();
        assert_eq!(task.state(), TaskState::Failed);
        assert_eq!(task.history.len(), 1);
    }

    #[tokio::test]
    async fn test_get_task_truncates_copy_only() {
        let mut responder = MockResponder::new();
        responder
            .expect_respond()
            .times(2)
            .returning(|text, _| Ok(format!("echo: {}", text)));

        let manager = manager(responder);
        for text in ["one", "two"] {
            let params = TaskSendParams::new("t1", Message::user(text));
            manager.on_send_task(params).await.unwrap();
        }

        let last = manager
            .on_get_task(TaskQueryParams::new("t1").with_history_length(1))
            .await
            .unwrap();
        assert_eq!(last.history.len(), 1);
        assert_eq!(last.history[0].text(), "echo: two");

        let full = manager
            .on_get_task(TaskQueryParams::new("t1"))
            .await
            .unwrap();
        assert_eq!(full.history.len(), 4);
    }

    #[tokio::test]
    async fn test_get_unknown_task() {
        let manager = manager(MockResponder::new());

        let err = manager
            .on_get_task(TaskQueryParams::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, A2AError::TaskNotFound { ref task_id } if task_id == "missing"));
    }

    #[tokio::test]
    async fn test_cancel_is_unsupported() {
        let manager = manager(MockResponder::new());

        let err = manager
            .on_cancel_task(TaskIdParams::new("t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, A2AError::Unsupported(_)));
    }
}
