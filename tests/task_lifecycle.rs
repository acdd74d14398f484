//! Task manager behavior through its public surface

mod common;

use std::sync::Arc;

use a2a_orchestrator::{
    prelude::*,
    protocol::TaskIdParams,
    server::{InMemoryTaskStore, TaskStore},
};
use common::{Broken, Echo};

fn send(id: &str, text: &str) -> TaskSendParams {
    TaskSendParams::new(id, Message::user(text)).with_session_id("session-1")
}

#[tokio::test]
async fn test_send_creates_submitted_then_completes() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    let created = manager.upsert_task(&send("t1", "hello")).await.unwrap();
    assert_eq!(created.state(), TaskState::Submitted);
    assert_eq!(created.history, vec![Message::user("hello")]);

    let fresh = InMemoryTaskManager::new(Arc::new(Echo));
    let task = fresh.on_send_task(send("t1", "hello")).await.unwrap();
    assert_eq!(task.state(), TaskState::Completed);
    assert_eq!(task.history.len(), 2);
    assert_eq!(task.history[0], Message::user("hello"));
    assert_eq!(task.history[1].role, Role::Agent);
    assert_eq!(task.history[1].text(), "echo: hello");
    assert_eq!(task.session_id.as_deref(), Some("session-1"));
}

#[tokio::test]
async fn test_get_task_twice_is_identical() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    manager.on_send_task(send("t1", "hello")).await.unwrap();

    let first = manager.on_get_task(TaskQueryParams::new("t1")).await.unwrap();
    let second = manager.on_get_task(TaskQueryParams::new("t1")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_task_is_an_error() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));

    let err = manager
        .on_get_task(TaskQueryParams::new("never-sent"))
        .await
        .unwrap_err();
    match err {
        A2AError::TaskNotFound { task_id } => assert_eq!(task_id, "never-sent"),
        other => panic!("Expected TaskNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_history_is_appended_in_order() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));

    let messages: Vec<Message> = (1..=5).map(|i| Message::user(format!("m{}", i))).collect();
    for message in &messages {
        manager
            .upsert_task(&TaskSendParams::new("t1", message.clone()))
            .await
            .unwrap();
    }

    let task = manager.on_get_task(TaskQueryParams::new("t1")).await.unwrap();
    assert_eq!(task.history, messages);
}

#[tokio::test]
async fn test_concurrent_tasks_keep_their_own_order() {
    let manager = Arc::new(InMemoryTaskManager::new(Arc::new(Echo)));

    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| {
            let manager = manager.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    let params = TaskSendParams::new(id, Message::user(format!("{}-{}", id, i)));
                    manager.upsert_task(&params).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    for id in ["a", "b", "c", "d"] {
        let task = manager.on_get_task(TaskQueryParams::new(id)).await.unwrap();
        let texts: Vec<String> = task.history.iter().map(Message::text).collect();
        let expected: Vec<String> = (0..20).map(|i| format!("{}-{}", id, i)).collect();
        assert_eq!(texts, expected);
    }
}

#[tokio::test]
async fn test_history_length_leaves_store_untouched() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    for i in 1..=5 {
        manager
            .upsert_task(&TaskSendParams::new("t1", Message::user(format!("m{}", i))))
            .await
            .unwrap();
    }

    let short = manager
        .on_get_task(TaskQueryParams::new("t1").with_history_length(1))
        .await
        .unwrap();
    assert_eq!(short.history, vec![Message::user("m5")]);

    let full = manager.on_get_task(TaskQueryParams::new("t1")).await.unwrap();
    assert_eq!(full.history.len(), 5);
}

#[tokio::test]
async fn test_send_honors_history_length() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    let task = manager
        .on_send_task(send("t1", "hello").with_history_length(1))
        .await
        .unwrap();

    assert_eq!(task.history.len(), 1);
    assert_eq!(task.history[0].text(), "echo: hello");
}

#[tokio::test]
async fn test_responder_failure_marks_task_failed() {
    let store = Arc::new(InMemoryTaskStore::new());
    let manager = InMemoryTaskManager::with_store(store.clone(), Arc::new(Broken));

    let err = manager.on_send_task(send("t1", "hello")).await.unwrap_err();
    assert!(err.to_string().contains("backend unavailable"));

    let task = store.get("t1").await.unwrap();
    assert_eq!(task.state(), TaskState::Failed);
    assert_eq!(task.history.len(), 1);

    let err = manager.on_send_task(send("t1", "again")).await.unwrap_err();
    assert!(matches!(err, A2AError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_completed_task_accepts_follow_ups() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    manager.on_send_task(send("t1", "first")).await.unwrap();

    let task = manager.on_send_task(send("t1", "second")).await.unwrap();
    let texts: Vec<String> = task.history.iter().map(Message::text).collect();
    assert_eq!(texts, ["first", "echo: first", "second", "echo: second"]);
    assert_eq!(task.state(), TaskState::Completed);
}

#[tokio::test]
async fn test_cancel_is_unsupported() {
    let manager = InMemoryTaskManager::new(Arc::new(Echo));
    manager.on_send_task(send("t1", "hello")).await.unwrap();

    let err = manager
        .on_cancel_task(TaskIdParams::new("t1"))
        .await
        .unwrap_err();
    assert!(matches!(err, A2AError::Unsupported(_)));
    assert!(err.is_application_error());
}
