//! Demo agents: a time teller, a greeter that asks the time teller, and the
//! card of the host agent that routes between them

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};
use tracing::warn;

use crate::{
    orchestrator::Delegator,
    protocol::{
        agent::{AgentCapabilities, AgentCard, AgentSkill},
        error::A2AError,
    },
    server::manager::Responder,
};

pub const TIME_AGENT_NAME: &str = "Tell Time Agent";
pub const GREETING_AGENT_NAME: &str = "Greeting Agent";
pub const HOST_AGENT_NAME: &str = "Host Agent";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_QUESTION: &str = "What is the current time?";

fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}/", host, port)
}

/// Card of the time-telling agent served at `host:port`
pub fn time_agent_card(host: &str, port: u16) -> AgentCard {
    AgentCard::new(
        TIME_AGENT_NAME,
        "Tells the current time when asked.",
        base_url(host, port),
    )
    .with_capabilities(AgentCapabilities::new())
    .with_skill(
        AgentSkill::new("tell_time", "Tell Time")
            .with_description("Replies with the current system time.")
            .with_tags(["time", "clock"])
            .with_examples(["What time is it?", "Tell me the current time"]),
    )
}

/// Card of the greeting agent served at `host:port`
pub fn greeting_agent_card(host: &str, port: u16) -> AgentCard {
    AgentCard::new(GREETING_AGENT_NAME, "Greets the user.", base_url(host, port)).with_skill(
        AgentSkill::new("greeting", "Greeting")
            .with_description("Greets the user with a message suited to the time of day.")
            .with_tags(["greeting", "greet", "hello", "morning", "evening"])
            .with_examples(["Hello", "Hi", "Greet me"]),
    )
}

/// Card of the host agent served at `host:port`
pub fn host_agent_card(host: &str, port: u16) -> AgentCard {
    AgentCard::new(
        HOST_AGENT_NAME,
        "Orchestrates tasks by delegating to specialized child agents.",
        base_url(host, port),
    )
    .with_skill(
        AgentSkill::new("orchestrate", "Orchestrate")
            .with_description("Routes each request to the child agent best suited to answer it.")
            .with_tags(["routing", "orchestration", "delegation", "time", "greeting"])
            .with_examples(["What time is it?", "Greet me"]),
    )
}

/// Replies with the current local time
#[derive(Debug, Clone, Default)]
pub struct TellTimeResponder;

impl TellTimeResponder {
    pub fn reply_for(now: NaiveDateTime) -> String {
        format!("The current time is {}.", now.format(TIME_FORMAT))
    }
}

#[async_trait]
impl Responder for TellTimeResponder {
    async fn respond(&self, _text: &str, _session_id: &str) -> Result<String, A2AError> {
        Ok(Self::reply_for(Local::now().naive_local()))
    }
}

/// Pull the timestamp out of a time agent reply
fn parse_reported_time(reply: &str) -> Option<NaiveDateTime> {
    let (_, stamp) = reply.trim().trim_end_matches('.').rsplit_once(" is ")?;
    NaiveDateTime::parse_from_str(stamp.trim(), TIME_FORMAT).ok()
}

fn salutation(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// Greets the user, asking the time agent what time it is first
pub struct GreetingResponder {
    delegator: Delegator,
}

impl GreetingResponder {
    pub fn new(delegator: Delegator) -> Self {
        Self { delegator }
    }

    /// Greeting for the time the time agent reported, if any
    pub fn greeting(time_reply: Option<&str>) -> String {
        match time_reply.and_then(parse_reported_time) {
            Some(time) => format!(
                "{}! The clock says {}, a fine moment to say hello.",
                salutation(time.hour()),
                time.format("%H:%M")
            ),
            None => format!(
                "{}! I could not check the time just now, but hello all the same.",
                salutation(Local::now().hour())
            ),
        }
    }
}

#[async_trait]
impl Responder for GreetingResponder {
    async fn respond(&self, _text: &str, session_id: &str) -> Result<String, A2AError> {
        let reply = match self
            .delegator
            .delegate(TIME_AGENT_NAME, TIME_QUESTION, session_id)
            .await
        {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %e, "time agent unavailable, greeting without the time");
                None
            }
        };

        Ok(Self::greeting(reply.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_time_reply_round_trips_through_greeting() {
        let reply = TellTimeResponder::reply_for(at(9, 30));
        assert_eq!(reply, "The current time is 2026-10-16 09:30:00.");
        assert_eq!(parse_reported_time(&reply), Some(at(9, 30)));

        let greeting = GreetingResponder::greeting(Some(&reply));
        assert!(greeting.starts_with("Good morning!"));
        assert!(greeting.contains("09:30"));
    }

    #[test]
    fn test_salutations() {
        assert_eq!(salutation(6), "Good morning");
        assert_eq!(salutation(12), "Good afternoon");
        assert_eq!(salutation(20), "Good evening");
        assert_eq!(salutation(2), "Good evening");
    }

    #[test]
    fn test_greeting_without_time() {
        let greeting = GreetingResponder::greeting(Some("I am not sure"));
        assert!(greeting.contains("could not check the time"));
        assert!(GreetingResponder::greeting(None).contains("could not check the time"));
    }

    #[test]
    fn test_cards() {
        let card = time_agent_card("localhost", 10000);
        assert_eq!(card.url, "http://localhost:10000/");
        assert_eq!(card.skills[0].tags, vec!["time", "clock"]);

        assert_eq!(greeting_agent_card("0.0.0.0", 10001).name, GREETING_AGENT_NAME);
        assert_eq!(host_agent_card("localhost", 10002).name, HOST_AGENT_NAME);
    }

    #[tokio::test]
    async fn test_tell_time_responder() {
        let reply = TellTimeResponder.respond("time?", "s1").await.unwrap();
        assert!(parse_reported_time(&reply).is_some());
    }
}
