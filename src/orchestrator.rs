//! Host-agent logic: pick a child agent for each request and delegate to it

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    connector::ConnectorCache,
    discovery::{AgentDirectory, DiscoveredAgent},
    protocol::{agent::AgentCard, error::A2AError},
    server::manager::Responder,
};

/// Chooses which child agent should answer a request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingPolicy: Send + Sync {
    /// Name of the agent to delegate to, `None` when no agent fits
    async fn decide(&self, request: &str, cards: &[AgentCard])
        -> Result<Option<String>, A2AError>;
}

/// Words that say nothing about which agent is meant
const STOPWORDS: &[&str] = &["agent", "the", "and", "for", "you", "what", "please"];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

/// Split `TellTimeAgent` into `Tell Time Agent`
fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

fn card_vocabulary(card: &AgentCard) -> HashSet<String> {
    let mut vocabulary: HashSet<String> = words(&split_camel_case(&card.name)).collect();
    for skill in &card.skills {
        vocabulary.extend(words(&skill.id));
        vocabulary.extend(words(&skill.name));
        for tag in &skill.tags {
            vocabulary.extend(words(tag));
        }
    }
    vocabulary
}

/// Routes by keywords
///
/// A request naming an agent goes to that agent. Otherwise the agent whose
/// name, skill names and skill tags share the most words with the request
/// wins, earlier cards winning ties.
#[derive(Debug, Clone, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous form of [`RoutingPolicy::decide`]
    pub fn choose<'a>(&self, request: &str, cards: &'a [AgentCard]) -> Option<&'a AgentCard> {
        let lowered = request.to_lowercase();
        if let Some(named) = cards
            .iter()
            .find(|card| lowered.contains(&card.name.to_lowercase()))
        {
            return Some(named);
        }

        let requested: HashSet<String> = words(request).collect();
        let mut best: Option<(&AgentCard, usize)> = None;
        for card in cards {
            let score = card_vocabulary(card).intersection(&requested).count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((card, score));
            }
        }
        best.map(|(card, _)| card)
    }
}

#[async_trait]
impl RoutingPolicy for KeywordPolicy {
    async fn decide(
        &self,
        request: &str,
        cards: &[AgentCard],
    ) -> Result<Option<String>, A2AError> {
        Ok(self.choose(request, cards).map(|card| card.name.clone()))
    }
}

/// Resolve an agent name: exact case-insensitive match first, then substring
pub fn find_agent<'a>(name: &str, agents: &'a [DiscoveredAgent]) -> Option<&'a DiscoveredAgent> {
    let wanted = name.to_lowercase();
    agents
        .iter()
        .find(|agent| agent.card.name.to_lowercase() == wanted)
        .or_else(|| {
            agents
                .iter()
                .find(|agent| agent.card.name.to_lowercase().contains(&wanted))
        })
}

fn describe_agents(cards: &[AgentCard]) -> String {
    cards
        .iter()
        .map(|card| {
            if card.description.is_empty() {
                format!("- {}", card.name)
            } else {
                format!("- {}: {}", card.name, card.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sends requests to child agents by name
///
/// Agents are looked up in a directory on every call; connectors are cached
/// per agent name.
pub struct Delegator {
    directory: Arc<dyn AgentDirectory>,
    connectors: ConnectorCache,
}

impl Delegator {
    pub fn new(directory: Arc<dyn AgentDirectory>) -> Self {
        Self {
            directory,
            connectors: ConnectorCache::default(),
        }
    }

    /// Use `connectors` for delegation, e.g. to change the request deadline
    pub fn with_connectors(mut self, connectors: ConnectorCache) -> Self {
        self.connectors = connectors;
        self
    }

    /// Currently reachable agents
    pub async fn discover(&self) -> Vec<DiscoveredAgent> {
        self.directory.discover().await
    }

    /// Names of the currently reachable agents
    pub async fn list_agents(&self) -> Vec<String> {
        self.directory
            .list_agent_cards()
            .await
            .into_iter()
            .map(|card| card.name)
            .collect()
    }

    /// Send `text` to the agent called `agent_name` and return its last reply
    ///
    /// # Errors
    ///
    /// `A2AError::AgentNotFound` when no reachable agent matches the name,
    /// otherwise whatever the connector reports.
    pub async fn delegate(
        &self,
        agent_name: &str,
        text: &str,
        session_id: &str,
    ) -> Result<String, A2AError> {
        let agents = self.discover().await;
        self.delegate_to(&agents, agent_name, text, session_id)
            .await
    }

    /// Like [`delegate`](Self::delegate), resolving the name among `agents`
    pub async fn delegate_to(
        &self,
        agents: &[DiscoveredAgent],
        agent_name: &str,
        text: &str,
        session_id: &str,
    ) -> Result<String, A2AError> {
        let agent = find_agent(agent_name, agents).ok_or_else(|| A2AError::AgentNotFound {
            name: agent_name.to_string(),
        })?;

        let connector = self.connectors.get_or_create(agent)?;
        info!(agent = %agent.card.name, session_id, "delegating request");

        let task = connector.send_task(text, session_id).await?;
        Ok(task
            .last_agent_message()
            .map(|message| message.text())
            .unwrap_or_default())
    }
}

/// Delegates every request to the child agent chosen by a [`RoutingPolicy`]
pub struct Orchestrator {
    delegator: Delegator,
    policy: Arc<dyn RoutingPolicy>,
}

impl Orchestrator {
    pub fn new(directory: Arc<dyn AgentDirectory>, policy: Arc<dyn RoutingPolicy>) -> Self {
        Self::with_delegator(Delegator::new(directory), policy)
    }

    pub fn with_delegator(delegator: Delegator, policy: Arc<dyn RoutingPolicy>) -> Self {
        Self { delegator, policy }
    }

    pub fn delegator(&self) -> &Delegator {
        &self.delegator
    }
}

#[async_trait]
impl Responder for Orchestrator {
    async fn respond(&self, text: &str, session_id: &str) -> Result<String, A2AError> {
        let agents = self.delegator.discover().await;
        if agents.is_empty() {
            warn!("no child agents reachable");
            return Ok("No agents are available right now.".to_string());
        }

        let cards: Vec<AgentCard> = agents.iter().map(|agent| agent.card.clone()).collect();
        let no_match = || {
            format!(
                "I could not find an agent for that request. Available agents:\n{}",
                describe_agents(&cards)
            )
        };

        let Some(name) = self.policy.decide(text, &cards).await? else {
            return Ok(no_match());
        };

        match self
            .delegator
            .delegate_to(&agents, &name, text, session_id)
            .await
        {
            Ok(reply) => Ok(reply),
            Err(A2AError::AgentNotFound { name }) => {
                warn!(agent = %name, "routing policy chose an unknown agent");
                Ok(no_match())
            }
            Err(e) if e.is_unreachable() => {
                warn!(agent = %name, error = %e, "child agent unreachable");
                Ok(format!("Sorry, I could not reach agent {} right now.", name))
            }
            Err(e) => Err(e),
        }
    }
}
