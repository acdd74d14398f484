use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use a2a_orchestrator::{
    agents::{
        greeting_agent_card, host_agent_card, time_agent_card, GreetingResponder,
        TellTimeResponder,
    },
    discovery::DiscoveryCache,
    orchestrator::Delegator,
    prelude::*,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about = "Multi-agent orchestration over the A2A protocol")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent server
    Serve {
        #[command(subcommand)]
        agent: AgentKind,
    },
    /// Chat with an agent from the terminal
    Chat(ChatArgs),
    /// List the agents in the registry that answer their card request
    Discover(RegistryArgs),
}

#[derive(Subcommand)]
enum AgentKind {
    /// Agent that tells the current time
    Time(ServeArgs),
    /// Agent that greets the user, asking the time agent for the time
    Greeting {
        #[command(flatten)]
        serve: ServeArgs,
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Agent that routes requests to the agents in the registry
    Host {
        #[command(flatten)]
        serve: ServeArgs,
        #[command(flatten)]
        registry: RegistryArgs,
        /// Reuse discovery results for this many seconds (0 probes on every request)
        #[arg(long, default_value_t = 0)]
        cache_ttl_secs: u64,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Defaults to 10002 for the time agent, 10001 for greeting and 10000 for host
    #[arg(long)]
    port: Option<u16>,
    /// Deadline for requests delegated to other agents
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Args)]
struct RegistryArgs {
    /// Registry file: a JSON list of agent URLs or {"agents": [...]}
    #[arg(long, env = "A2A_REGISTRY", default_value = "agent_registry.json")]
    registry: PathBuf,
    /// Deadline for each agent card request
    #[arg(long, default_value_t = 5)]
    probe_timeout_secs: u64,
}

impl RegistryArgs {
    fn config(&self) -> DiscoveryConfig {
        DiscoveryConfig::new(&self.registry)
            .with_probe_timeout(Duration::from_secs(self.probe_timeout_secs))
    }
}

#[derive(Args)]
struct ChatArgs {
    /// Base URL of the agent to talk to
    #[arg(long, default_value = "http://localhost:10000")]
    agent: Url,
    /// Session id, 0 to start a new session
    #[arg(long, default_value = "0")]
    session: String,
    /// Print the task history after every reply
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "a2a_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { agent } => serve(agent).await,
        Commands::Chat(args) => chat(args).await,
        Commands::Discover(args) => discover(args).await,
    }
}

/// Card, responder and listen settings of the agent to run
type Launch = (AgentCard, Arc<dyn Responder>, ServeArgs, u16);

async fn serve(agent: AgentKind) -> Result<()> {
    let (card, responder, serve, port): Launch = match agent {
        AgentKind::Time(serve) => {
            let port = serve.port.unwrap_or(10002);
            let responder: Arc<dyn Responder> = Arc::new(TellTimeResponder);
            (time_agent_card(&serve.host, port), responder, serve, port)
        }
        AgentKind::Greeting { serve, registry } => {
            let port = serve.port.unwrap_or(10001);
            let directory = DiscoveryClient::load(&registry.config()).await;
            let delegator = Delegator::new(Arc::new(directory))
                .with_connectors(ConnectorCache::new(Duration::from_secs(serve.timeout_secs)));
            let responder: Arc<dyn Responder> = Arc::new(GreetingResponder::new(delegator));
            (greeting_agent_card(&serve.host, port), responder, serve, port)
        }
        AgentKind::Host {
            serve,
            registry,
            cache_ttl_secs,
        } => {
            let port = serve.port.unwrap_or(10000);
            let client = DiscoveryClient::load(&registry.config()).await;
            let directory: Arc<dyn AgentDirectory> = if cache_ttl_secs == 0 {
                Arc::new(client)
            } else {
                Arc::new(DiscoveryCache::new(
                    Arc::new(client),
                    Duration::from_secs(cache_ttl_secs),
                ))
            };
            let delegator = Delegator::new(directory)
                .with_connectors(ConnectorCache::new(Duration::from_secs(serve.timeout_secs)));
            let responder: Arc<dyn Responder> = Arc::new(Orchestrator::with_delegator(
                delegator,
                Arc::new(KeywordPolicy::new()),
            ));
            (host_agent_card(&serve.host, port), responder, serve, port)
        }
    };

    let listener = TcpListener::bind((serve.host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", serve.host, port))?;

    let server = A2AServer::new(card, Arc::new(InMemoryTaskManager::new(responder)));
    server.serve_with_listener(listener).await?;
    Ok(())
}

fn describe_error(agent: &Url, err: &A2AError) -> String {
    match err {
        e if e.is_unreachable() => format!("could not reach agent at {} ({})", agent, e),
        A2AError::Rpc { message, .. } => message.clone(),
        A2AError::TaskNotFound { .. } => "task not found".to_string(),
        other => other.to_string(),
    }
}

async fn chat(args: ChatArgs) -> Result<()> {
    let session_id = if args.session == "0" {
        Uuid::new_v4().simple().to_string()
    } else {
        args.session.clone()
    };

    let mut client = A2AClientBuilder::new_http(args.agent.clone()).build()?;
    match client.discover().await {
        Ok(card) => println!("Connected to {} (session {})", card.name, session_id),
        Err(e) => {
            println!("{}", describe_error(&args.agent, &e));
            return Ok(());
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt.to_lowercase().as_str(), ":q" | "quit") {
            break;
        }

        let params = TaskSendParams::new(Uuid::new_v4().simple().to_string(), Message::user(prompt))
            .with_session_id(session_id.clone());

        match client.send_task(params).await {
            Ok(task) => {
                match task.last_agent_message() {
                    Some(reply) => println!("{}", reply.text()),
                    None => println!("(task {} is {}, no reply yet)", task.id, task.state()),
                }
                if args.history {
                    println!("\nHistory of task {}:", task.id);
                    for (i, message) in task.history.iter().enumerate() {
                        let role = match message.role {
                            Role::User => "user",
                            Role::Agent => "agent",
                        };
                        println!("  {}. [{}] {}", i + 1, role, message.text());
                    }
                }
            }
            Err(e) => println!("{}", describe_error(&args.agent, &e)),
        }
    }

    info!(session_id = %session_id, "chat ended");
    Ok(())
}

async fn discover(args: RegistryArgs) -> Result<()> {
    let client = DiscoveryClient::load(&args.config()).await;
    let agents = client.discover().await;

    if agents.is_empty() {
        println!("No agents reachable ({} registered)", client.entries().len());
    }
    for agent in agents {
        println!("{}  {}", agent.card.name, agent.card.url);
        if !agent.card.description.is_empty() {
            println!("    {}", agent.card.description);
        }
    }
    Ok(())
}
