//! Task storage
//!
//! The store owns every task; callers only ever see clones. Updates are
//! applied atomically per task id.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::protocol::{
    error::A2AError,
    message::Message,
    task::{Task, TaskState},
};

/// A change applied to a stored task
#[derive(Debug, Clone)]
pub enum TaskUpdate {
    /// Create the task from its first message, or append the message to it
    Submit {
        message: Message,
        session_id: String,
        metadata: Option<HashMap<String, Value>>,
    },

    /// Append an agent reply and move the task to `state` in one step
    Reply { message: Message, state: TaskState },

    /// Move the task to `state` without touching its history
    Status(TaskState),
}

/// Storage backend for tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Clone of the task with this id
    async fn get(&self, id: &str) -> Option<Task>;

    /// Apply `update` atomically and return the resulting task
    ///
    /// Only [`TaskUpdate::Submit`] may create a task; other updates on an
    /// unknown id fail with `TaskNotFound`.
    async fn upsert(&self, id: &str, update: TaskUpdate) -> Result<Task, A2AError>;

    /// Remove a task, returning it if it existed
    async fn delete(&self, id: &str) -> Option<Task>;
}

/// In-memory task store
///
/// One lock guards the id → task map, and each task has its own lock, so
/// updates to different tasks never wait on each other.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Arc<Mutex<Task>>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

fn not_found(id: &str) -> A2AError {
    A2AError::TaskNotFound {
        task_id: id.to_string(),
    }
}

/// Build a new task from its first update
fn create(id: &str, update: TaskUpdate) -> Result<Task, A2AError> {
    match update {
        TaskUpdate::Submit {
            message,
            session_id,
            metadata,
        } => {
            let mut task = Task::new(id, message).with_session_id(session_id);
            task.metadata = metadata;
            Ok(task)
        }
        _ => Err(not_found(id)),
    }
}

fn apply(task: &mut Task, update: TaskUpdate) -> Result<(), A2AError> {
    match update {
        TaskUpdate::Submit { message, .. } => {
            // Failed and canceled tasks accept no further messages
            if matches!(task.state(), TaskState::Failed | TaskState::Canceled) {
                return Err(A2AError::InvalidTransition {
                    task_id: task.id.clone(),
                    from: task.state(),
                    to: TaskState::Submitted,
                });
            }
            task.push_message(message);
        }
        TaskUpdate::Reply { message, state } => {
            task.transition(state)?;
            task.push_message(message);
        }
        TaskUpdate::Status(state) => task.transition(state)?,
    }
    Ok(())
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, id: &str) -> Option<Task> {
        let slot = self.tasks.read().await.get(id).cloned()?;
        let task = slot.lock().await;
        Some(task.clone())
    }

    async fn upsert(&self, id: &str, update: TaskUpdate) -> Result<Task, A2AError> {
        let existing = self.tasks.read().await.get(id).cloned();

        let slot = match existing {
            Some(slot) => slot,
            None => {
                if !matches!(update, TaskUpdate::Submit { .. }) {
                    return Err(not_found(id));
                }

                let mut tasks = self.tasks.write().await;
                match tasks.entry(id.to_string()) {
                    // Another submit created the task after the read above
                    Entry::Occupied(entry) => entry.get().clone(),
                    Entry::Vacant(entry) => {
                        let task = create(id, update)?;
                        entry.insert(Arc::new(Mutex::new(task.clone())));
                        debug!(task_id = id, "created task");
                        return Ok(task);
                    }
                }
            }
        };

        let mut task = slot.lock().await;
        apply(&mut task, update)?;
        Ok(task.clone())
    }

    async fn delete(&self, id: &str) -> Option<Task> {
        let slot = self.tasks.write().await.remove(id)?;
        let task = slot.lock().await;
        Some(task.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(text: &str) -> TaskUpdate {
        TaskUpdate::Submit {
            message: Message::user(text),
            session_id: "s1".to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_submit_creates_then_appends() {
        let store = InMemoryTaskStore::new();

        let task = store.upsert("t1", submit("one")).await.unwrap();
        assert_eq!(task.state(), TaskState::Submitted);
        assert_eq!(task.session_id.as_deref(), Some("s1"));
        assert_eq!(task.history.len(), 1);

        let task = store.upsert("t1", submit("two")).await.unwrap();
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[1].text(), "two");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reply_on_unknown_task() {
        let store = InMemoryTaskStore::new();
        let update = TaskUpdate::Reply {
            message: Message::agent("hi"),
            state: TaskState::Completed,
        };

        let err = store.upsert("missing", update).await.unwrap_err();
        assert!(matches!(err, A2AError::TaskNotFound { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_reply_appends_and_completes() {
        let store = InMemoryTaskStore::new();
        store.upsert("t1", submit("hello")).await.unwrap();

        let task = store
            .upsert(
                "t1",
                TaskUpdate::Reply {
                    message: Message::agent("hi"),
                    state: TaskState::Completed,
                },
            )
            .await
            .unwrap();

        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.last_agent_message().unwrap().text(), "hi");
    }

    #[tokio::test]
    async fn test_failed_task_rejects_messages() {
        let store = InMemoryTaskStore::new();
        store.upsert("t1", submit("hello")).await.unwrap();
        store
            .upsert("t1", TaskUpdate::Status(TaskState::Failed))
            .await
            .unwrap();

        let err = store.upsert("t1", submit("again")).await.unwrap_err();
        assert!(matches!(err, A2AError::InvalidTransition { .. }));
        assert_eq!(store.get("t1").await.unwrap().history.len(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_independent_copy() {
        let store = InMemoryTaskStore::new();
        store.upsert("t1", submit("hello")).await.unwrap();

        let mut copy = store.get("t1").await.unwrap();
        copy.history.clear();

        assert_eq!(store.get("t1").await.unwrap().history.len(), 1);
    }

    #[test]
    fn test_status_transitions_outside_a_runtime() {
        tokio_test::block_on(async {
            let store = InMemoryTaskStore::new();
            store.upsert("t1", submit("hello")).await.unwrap();

            tokio_test::assert_ok!(
                store
                    .upsert("t1", TaskUpdate::Status(TaskState::Working))
                    .await
            );
            tokio_test::assert_ok!(
                store
                    .upsert("t1", TaskUpdate::Status(TaskState::Canceled))
                    .await
            );
            tokio_test::assert_err!(
                store
                    .upsert("t1", TaskUpdate::Status(TaskState::Working))
                    .await
            );
            tokio_test::assert_err!(
                store
                    .upsert("t2", TaskUpdate::Status(TaskState::Working))
                    .await
            );
        });
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryTaskStore::new();
        store.upsert("t1", submit("hello")).await.unwrap();

        assert!(store.delete("t1").await.is_some());
        assert!(store.get("t1").await.is_none());
        assert!(store.delete("t1").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submits_keep_every_message() {
        let store = Arc::new(InMemoryTaskStore::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert("shared", submit(&format!("m{}", i)))
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let task = store.get("shared").await.unwrap();
        assert_eq!(task.history.len(), 32);
        assert_eq!(store.len().await, 1);
    }
}
