//! A2A service response types

use crate::protocol::{agent::AgentCard, error::A2AError, task::Task};

/// Response from an A2A service operation
#[derive(Debug, Clone)]
pub enum A2AResponse {
    /// Task response (from tasks/send, tasks/get, tasks/cancel)
    Task(Box<Task>),

    /// Agent card response (from DiscoverAgent)
    AgentCard(Box<AgentCard>),

    /// Empty response (for operations with no return value)
    Empty,
}

impl A2AResponse {
    /// Extract a task from the response, if present
    pub fn into_task(self) -> Option<Task> {
        match self {
            A2AResponse::Task(task) => Some(*task),
            _ => None,
        }
    }

    /// Extract an agent card from the response, if present
    pub fn into_agent_card(self) -> Option<AgentCard> {
        match self {
            A2AResponse::AgentCard(card) => Some(*card),
            _ => None,
        }
    }

    /// Like [`into_task`](Self::into_task), but a missing task is a protocol error
    pub fn expect_task(self) -> Result<Task, A2AError> {
        self.into_task()
            .ok_or_else(|| A2AError::Protocol("Expected Task response".to_string()))
    }

    /// Like [`into_agent_card`](Self::into_agent_card), but a missing card is a protocol error
    pub fn expect_agent_card(self) -> Result<AgentCard, A2AError> {
        self.into_agent_card()
            .ok_or_else(|| A2AError::Protocol("Expected AgentCard response".to_string()))
    }

    /// Check if the response is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, A2AResponse::Empty)
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::Message;

    use super::*;

    #[test]
    fn test_response_task() {
        let task = Task::new("task-123", Message::user("Test"));
        let response = A2AResponse::Task(Box::new(task));

        assert!(matches!(response, A2AResponse::Task(_)));

        let extracted = response.into_task();
        assert!(extracted.is_some());
        assert_eq!(extracted.unwrap().id, "task-123");
    }

    #[test]
    fn test_expect_task_on_card() {
        let card = AgentCard::new("Echo", "", "http://localhost:1/");
        let response = A2AResponse::AgentCard(Box::new(card));

        assert!(matches!(
            response.expect_task(),
            Err(A2AError::Protocol(_))
        ));
    }

    #[test]
    fn test_response_empty() {
        let response = A2AResponse::Empty;
        assert!(response.is_empty());
        assert!(response.expect_agent_card().is_err());
    }
}
