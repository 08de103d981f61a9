//! Scripted gateway shared by the store tests

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use agentdesk_api::{
    Agent, AgentId, AssistantReply, Conversation, ConversationId, ConversationPage,
    ConversationQuery, Message, MessageId, MessageStatus, SendRequest, SendResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::gateway::Gateway;

/// A request the mock received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send(SendRequest),
    List {
        query: Option<String>,
        cursor: Option<String>,
    },
    Messages(ConversationId),
    Delete(ConversationId),
    Agents,
}

/// Scripted failure: status code and message
type Failure = (u16, String);

#[derive(Default)]
struct Script {
    listing: Vec<Conversation>,
    query_delays: HashMap<Option<String>, Duration>,
    query_failures: HashMap<Option<String>, Failure>,
    histories: HashMap<ConversationId, Result<Vec<Message>, Failure>>,
    history_delays: HashMap<ConversationId, Duration>,
    sends: VecDeque<Result<SendResponse, Failure>>,
    send_delay: Option<Duration>,
    delete_delay: Option<Duration>,
    delete_failure: Option<Failure>,
    agents: Vec<Agent>,
    calls: Vec<Call>,
}

/// In-memory backend. Listing is served from a seeded list with offset
/// cursors; delays only mean something under a paused tokio clock.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<Script>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_listing(&self, conversations: Vec<Conversation>) {
        self.script.lock().listing = conversations;
    }

    pub fn delay_query(&self, query: Option<&str>, delay: Duration) {
        self.script
            .lock()
            .query_delays
            .insert(query.map(str::to_string), delay);
    }

    pub fn fail_query(&self, query: Option<&str>, status: u16, message: &str) {
        self.script
            .lock()
            .query_failures
            .insert(query.map(str::to_string), (status, message.to_string()));
    }

    pub fn set_history(&self, id: ConversationId, messages: Vec<Message>) {
        self.script.lock().histories.insert(id, Ok(messages));
    }

    pub fn fail_history(&self, id: ConversationId, status: u16, message: &str) {
        self.script
            .lock()
            .histories
            .insert(id, Err((status, message.to_string())));
    }

    pub fn delay_history(&self, id: ConversationId, delay: Duration) {
        self.script.lock().history_delays.insert(id, delay);
    }

    pub fn push_send(&self, reply: Result<SendResponse, Failure>) {
        self.script.lock().sends.push_back(reply);
    }

    pub fn delay_sends(&self, delay: Duration) {
        self.script.lock().send_delay = Some(delay);
    }

    pub fn delay_deletes(&self, delay: Duration) {
        self.script.lock().delete_delay = Some(delay);
    }

    pub fn fail_deletes(&self, status: u16, message: &str) {
        self.script.lock().delete_failure = Some((status, message.to_string()));
    }

    pub fn set_agents(&self, agents: Vec<Agent>) {
        self.script.lock().agents = agents;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn send_requests(&self) -> Vec<SendRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

fn into_api<T>(result: Result<T, Failure>) -> agentdesk_api::Result<T> {
    result.map_err(|(status, message)| agentdesk_api::Error::api(status, message))
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send_message(&self, request: SendRequest) -> agentdesk_api::Result<SendResponse> {
        let (reply, delay) = {
            let mut script = self.script.lock();
            script.calls.push(Call::Send(request));
            let reply = script
                .sends
                .pop_front()
                .unwrap_or_else(|| Err((500, "no scripted reply".into())));
            (reply, script.send_delay)
        };
        pause(delay).await;
        into_api(reply)
    }

    async fn list_conversations(
        &self,
        query: ConversationQuery,
    ) -> agentdesk_api::Result<ConversationPage> {
        let (page, delay) = {
            let mut script = self.script.lock();
            script.calls.push(Call::List {
                query: query.query.clone(),
                cursor: query.cursor.clone(),
            });
            let delay = script.query_delays.get(&query.query).copied();
            let page = match script.query_failures.get(&query.query) {
                Some(failure) => Err(failure.clone()),
                None => {
                    let needle = query.query.as_deref().map(str::to_lowercase);
                    let matching: Vec<Conversation> = script
                        .listing
                        .iter()
                        .filter(|c| {
                            needle.as_deref().is_none_or(|n| {
                                c.display_title().to_lowercase().contains(n)
                            })
                        })
                        .cloned()
                        .collect();
                    let offset: usize = query
                        .cursor
                        .as_deref()
                        .and_then(|c| c.parse().ok())
                        .unwrap_or(0);
                    let limit = query.limit.unwrap_or(20);
                    let end = offset + limit;
                    Ok(ConversationPage {
                        items: matching.iter().skip(offset).take(limit).cloned().collect(),
                        next_cursor: (end < matching.len()).then(|| end.to_string()),
                    })
                }
            };
            (page, delay)
        };
        pause(delay).await;
        into_api(page)
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
    ) -> agentdesk_api::Result<Vec<Message>> {
        let (history, delay) = {
            let mut script = self.script.lock();
            script.calls.push(Call::Messages(conversation_id));
            let history = script
                .histories
                .get(&conversation_id)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()));
            (history, script.history_delays.get(&conversation_id).copied())
        };
        pause(delay).await;
        into_api(history)
    }

    async fn delete_conversation(&self, conversation_id: ConversationId) -> agentdesk_api::Result<()> {
        let (outcome, delay) = {
            let mut script = self.script.lock();
            script.calls.push(Call::Delete(conversation_id));
            let outcome = match script.delete_failure.clone() {
                Some(failure) => Err(failure),
                None => {
                    script.listing.retain(|c| c.id != Some(conversation_id));
                    Ok(())
                }
            };
            (outcome, script.delete_delay)
        };
        pause(delay).await;
        into_api(outcome)
    }

    async fn list_agents(&self) -> agentdesk_api::Result<Vec<Agent>> {
        let mut script = self.script.lock();
        script.calls.push(Call::Agents);
        Ok(script.agents.clone())
    }
}

/// Listed conversation; higher ids are older so seeded order survives sorting
pub fn conversation(id: i64, title: &str) -> Conversation {
    Conversation::new(
        ConversationId(id),
        Some(title.to_string()),
        Utc::now() - chrono::Duration::minutes(id),
    )
}

/// Confirmed assistant message as the history endpoint returns it
pub fn server_message(id: i64, text: &str) -> Message {
    let mut message = Message::assistant(text, None);
    message.id = MessageId::Server(id);
    message.timestamp = Utc::now() - chrono::Duration::hours(1);
    message
}

pub fn server_user_message(id: i64, text: &str) -> Message {
    let mut message = Message::user(text);
    message.id = MessageId::Server(id);
    message.status = MessageStatus::Sent;
    message.timestamp = Utc::now() - chrono::Duration::hours(1);
    message
}

pub fn reply(conversation_id: i64, text: &str, agent_name: Option<&str>) -> SendResponse {
    SendResponse {
        conversation_id: ConversationId(conversation_id),
        title: None,
        message: AssistantReply {
            text: text.to_string(),
            agent_name: agent_name.map(str::to_string),
            execution_steps: vec![],
        },
        agents_used: vec![],
        tools_used: vec![],
        user_message_id: None,
        message_id: None,
    }
}

pub fn agent(id: i64, name: &str, department: &str) -> Agent {
    Agent {
        id: AgentId(id),
        name: name.to_string(),
        description: None,
        department: department.to_string(),
        created_by: None,
        tools: vec![],
        is_active: true,
        is_main_router: false,
    }
}
