//! Agent discovery
//!
//! A registry file lists agent base URLs; each agent publishes its card at
//! `/.well-known/agent.json`. Discovery never fails as a whole: unreadable
//! registries and unreachable agents are logged and skipped.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    client::A2AClientBuilder,
    layer::AuthCredentials,
    protocol::{agent::AgentCard, error::A2AError},
};

/// Default location of the registry file
pub const DEFAULT_REGISTRY_PATH: &str = "agent_registry.json";

/// Probe deadline per agent
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One agent listed in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Display name; the card's own name is authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Base URL of the agent
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Bearer token presented to the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Other credentials; takes precedence over `token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthCredentials>,
}

impl RegistryEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
            description: None,
            token: None,
            auth: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthCredentials) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Credentials to present to this agent, if any
    pub fn credentials(&self) -> Option<AuthCredentials> {
        self.auth
            .clone()
            .or_else(|| self.token.clone().map(AuthCredentials::bearer))
    }
}

/// Accepted registry layouts: a bare list of URLs or `{"agents": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Urls(Vec<String>),
    Entries { agents: Vec<RegistryEntry> },
}

impl From<RegistryFile> for Vec<RegistryEntry> {
    fn from(file: RegistryFile) -> Self {
        match file {
            RegistryFile::Urls(urls) => urls.into_iter().map(RegistryEntry::new).collect(),
            RegistryFile::Entries { agents } => agents,
        }
    }
}

/// Parse registry contents
pub fn parse_registry(contents: &str) -> Result<Vec<RegistryEntry>, A2AError> {
    let file: RegistryFile = serde_json::from_str(contents).map_err(|e| {
        A2AError::Validation(format!(
            "Registry must be a JSON list of URLs or an object with an 'agents' list: {}",
            e
        ))
    })?;
    Ok(file.into())
}

/// Where to find the registry and how long to wait for each agent
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub registry_path: PathBuf,
    pub probe_timeout: Duration,
}

impl DiscoveryConfig {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_PATH)
    }
}

/// An agent that answered its card request
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredAgent {
    pub entry: RegistryEntry,
    pub card: AgentCard,
}

/// Source of the currently reachable agents
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Reachable agents, in registry order
    async fn discover(&self) -> Vec<DiscoveredAgent>;

    /// Cards of the reachable agents, in registry order
    async fn list_agent_cards(&self) -> Vec<AgentCard> {
        self.discover()
            .await
            .into_iter()
            .map(|agent| agent.card)
            .collect()
    }
}

/// Reads a registry and fetches the card of every listed agent
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    entries: Vec<RegistryEntry>,
    probe_timeout: Duration,
}

impl DiscoveryClient {
    /// Client over an explicit list of entries
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        Self {
            entries,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Load the registry named by `config`
    ///
    /// A missing file yields an empty registry with a warning, malformed
    /// contents an empty registry with an error log.
    pub async fn load(config: &DiscoveryConfig) -> Self {
        let entries = load_registry(&config.registry_path).await;
        Self::from_entries(entries).with_probe_timeout(config.probe_timeout)
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Registry entries in file order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    async fn probe(&self, entry: &RegistryEntry) -> Result<AgentCard, A2AError> {
        let url = Url::parse(&entry.url)
            .map_err(|e| A2AError::Validation(format!("Invalid agent URL: {}", e)))?;

        let mut builder = A2AClientBuilder::new_http(url).with_timeout(self.probe_timeout);
        if let Some(credentials) = entry.credentials() {
            builder = builder.with_auth(credentials);
        }

        builder.build()?.discover().await
    }
}

async fn load_registry(path: &Path) -> Vec<RegistryEntry> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "registry file not readable");
            return Vec::new();
        }
    };

    match parse_registry(&contents) {
        Ok(entries) => {
            debug!(path = %path.display(), count = entries.len(), "loaded agent registry");
            entries
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to parse registry file");
            Vec::new()
        }
    }
}

#[async_trait]
impl AgentDirectory for DiscoveryClient {
    async fn discover(&self) -> Vec<DiscoveredAgent> {
        let probes = self.entries.iter().map(|entry| async move {
            match self.probe(entry).await {
                Ok(card) => Some(DiscoveredAgent {
                    entry: entry.clone(),
                    card,
                }),
                Err(e) => {
                    warn!(url = %entry.url, error = %e, "agent discovery failed");
                    None
                }
            }
        });

        let agents: Vec<_> = join_all(probes).await.into_iter().flatten().collect();
        info!(
            found = agents.len(),
            registered = self.entries.len(),
            "discovered agents"
        );
        agents
    }
}

/// Keeps the last discovery result for `ttl`
pub struct DiscoveryCache {
    inner: Arc<dyn AgentDirectory>,
    ttl: Duration,
    snapshot: Mutex<Option<(Instant, Vec<DiscoveredAgent>)>>,
}

impl DiscoveryCache {
    pub fn new(inner: Arc<dyn AgentDirectory>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// Drop the snapshot so the next call probes again
    pub async fn invalidate(&self) {
        *self.snapshot.lock().await = None;
    }
}

#[async_trait]
impl AgentDirectory for DiscoveryCache {
    async fn discover(&self) -> Vec<DiscoveredAgent> {
        let mut snapshot = self.snapshot.lock().await;
        if let Some((taken, agents)) = snapshot.as_ref() {
            if taken.elapsed() < self.ttl {
                return agents.clone();
            }
        }

        let agents = self.inner.discover().await;
        *snapshot = Some((Instant::now(), agents.clone()));
        agents
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_parse_url_list() {
        let entries =
            parse_registry(r#"["http://localhost:10000", "http://localhost:10001/"]"#).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url, "http://localhost:10001/");
        assert!(entries[0].name.is_none());
    }

    #[test]
    fn test_parse_agents_object() {
        let entries = parse_registry(
            r#"{"agents": [
                {"name": "TellTimeAgent", "url": "http://localhost:10000", "description": "time"},
                {"name": "Private", "url": "http://localhost:10005", "token": "abc"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(entries[0].name.as_deref(), Some("TellTimeAgent"));
        assert_eq!(entries[1].token.as_deref(), Some("abc"));
        assert_eq!(entries[1].credentials(), Some(AuthCredentials::bearer("abc")));
        assert_eq!(entries[0].credentials(), None);
    }

    #[test]
    fn test_explicit_auth_wins_over_token() {
        let entries = parse_registry(
            r#"{"agents": [{
                "url": "http://localhost:10005",
                "token": "ignored",
                "auth": {"type": "basic", "username": "host", "password": "pw"}
            }]}"#,
        )
        .unwrap();

        assert_eq!(
            entries[0].credentials(),
            Some(AuthCredentials::basic("host", "pw"))
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_registry(r#"{"urls": []}"#).is_err());
        assert!(parse_registry("not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_registry_is_empty() {
        let config = DiscoveryConfig::new("/nonexistent/agent_registry.json");
        let client = DiscoveryClient::load(&config).await;

        assert!(client.entries().is_empty());
        assert!(client.list_agent_cards().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_skipped() {
        let client = DiscoveryClient::from_entries(vec![RegistryEntry::new("not a url")]);
        assert!(client.discover().await.is_empty());
    }

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentDirectory for Counting {
        async fn discover(&self) -> Vec<DiscoveredAgent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![DiscoveredAgent {
                entry: RegistryEntry::new("http://localhost:10000"),
                card: AgentCard::new("TellTimeAgent", "", "http://localhost:10000/"),
            }]
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_snapshot_until_invalidated() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cache = DiscoveryCache::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cache.list_agent_cards().await.len(), 1);
        assert_eq!(cache.discover().await.len(), 1);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache.discover().await;
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_probes() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cache = DiscoveryCache::new(inner.clone(), Duration::ZERO);

        cache.discover().await;
        cache.discover().await;
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
