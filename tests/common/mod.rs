//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use a2a_orchestrator::prelude::*;
use async_trait::async_trait;
use tokio::net::TcpListener;

pub const LOCALHOST: &str = "127.0.0.1";

/// Replies with the text it was sent
pub struct Echo;

#[async_trait]
impl Responder for Echo {
    async fn respond(&self, text: &str, _session_id: &str) -> Result<String, A2AError> {
        Ok(format!("echo: {}", text))
    }
}

/// Always fails, as a responder whose backend is down would
pub struct Broken;

#[async_trait]
impl Responder for Broken {
    async fn respond(&self, _text: &str, _session_id: &str) -> Result<String, A2AError> {
        Err(A2AError::Other("backend unavailable".to_string()))
    }
}

/// Bind an ephemeral port
pub async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Serve an agent on an ephemeral port and return its card
pub async fn spawn_agent<F>(card_for: F, responder: Arc<dyn Responder>) -> AgentCard
where
    F: FnOnce(&str, u16) -> AgentCard,
{
    let (listener, port) = listener().await;
    let card = card_for(LOCALHOST, port);
    let server = A2AServer::new(card.clone(), Arc::new(InMemoryTaskManager::new(responder)));
    tokio::spawn(server.serve_with_listener(listener));
    card
}

/// Card of a plain echo agent
pub fn echo_card(name: &str) -> impl FnOnce(&str, u16) -> AgentCard + '_ {
    move |host, port| {
        AgentCard::new(
            name,
            "Repeats what it is told",
            format!("http://{}:{}/", host, port),
        )
    }
}

/// A base URL nothing listens on
pub async fn dead_url() -> String {
    let (listener, port) = listener().await;
    drop(listener);
    format!("http://{}:{}/", LOCALHOST, port)
}
