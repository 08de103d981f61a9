//! Core entity types and wire shapes for the chat backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::department::AgentKind;

/// Title shown for a conversation the server has not named yet
pub const DEFAULT_CONVERSATION_TITLE: &str = "New conversation";

/// Server-assigned conversation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned agent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub i64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A thread of messages between the user and one or more agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// `None` until the server has persisted the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "sessionName")]
    pub title: Option<String>,
    /// Last activity
    #[serde(alias = "updatedAt")]
    pub timestamp: DateTime<Utc>,
    /// True while a delete for this row is in flight
    #[serde(skip)]
    pub loading: bool,
}

impl Conversation {
    /// A persisted conversation with a known id
    pub fn new(id: ConversationId, title: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            title,
            timestamp,
            loading: false,
        }
    }

    /// Title to render, falling back to the placeholder
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_CONVERSATION_TITLE)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Message identifier: confirmed by the server, or a local placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Server(i64),
    Local(Uuid),
}

impl MessageId {
    /// Fresh local placeholder
    pub fn local() -> Self {
        MessageId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageId::Local(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Server(id) => write!(f, "{}", id),
            MessageId::Local(id) => write!(f, "local-{}", id),
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "agent")]
    Assistant,
}

/// Delivery state of a message as seen by this client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Shown optimistically, request outstanding
    Pending,
    /// Confirmed by the server
    #[default]
    Sent,
    /// Request failed; kept visible so the user can resend
    Failed,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "MessageId::local")]
    pub id: MessageId,
    #[serde(alias = "role")]
    pub sender: Sender,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "agent_name")]
    pub agent_name: Option<String>,
    /// Tool/sub-agent calls that produced this (assistant) message, in order
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        alias = "executionSteps",
        alias = "execution_steps"
    )]
    pub execution_details: Vec<ExecutionStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "agents_used")]
    pub agents_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "tools_used")]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Optimistic user message awaiting confirmation
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::local(),
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
            agent_name: None,
            execution_details: vec![],
            agents_used: vec![],
            tools_used: vec![],
            status: MessageStatus::Pending,
        }
    }

    /// Confirmed assistant message
    pub fn assistant(text: impl Into<String>, agent_name: Option<String>) -> Self {
        Self {
            id: MessageId::local(),
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            agent_name,
            execution_details: vec![],
            agents_used: vec![],
            tools_used: vec![],
            status: MessageStatus::Sent,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }

    /// Whether this message only exists on this client so far
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self.status, MessageStatus::Pending | MessageStatus::Failed)
    }
}

/// One recorded tool or sub-agent invocation within an assistant response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    #[serde(alias = "tool_name")]
    pub tool_name: String,
    /// Raw input, usually JSON text
    #[serde(default, alias = "tool_input", deserialize_with = "string_or_json")]
    pub tool_input: String,
    #[serde(default, deserialize_with = "string_or_json")]
    pub observation: String,
}

impl ExecutionStep {
    pub fn new(
        tool_name: impl Into<String>,
        tool_input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_input: tool_input.into(),
            observation: observation.into(),
        }
    }

    /// Tool input pretty-printed as JSON, or the raw text if it is not JSON
    pub fn pretty_input(&self) -> String {
        match serde_json::from_str::<serde_json::Value>(&self.tool_input) {
            Ok(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| self.tool_input.clone())
            }
            Err(_) => self.tool_input.clone(),
        }
    }
}

/// The backend sometimes sends tool inputs as objects instead of strings.
fn string_or_json<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// A tool enabled on an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTool {
    #[serde(alias = "name")]
    pub id: String,
    /// Persisted per-agent configuration, opaque to the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

/// A named automated responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub department: String,
    /// Owning user, used for edit permission checks
    #[serde(default, alias = "createdById", alias = "created_by_id")]
    pub created_by: Option<i64>,
    #[serde(default, alias = "functions")]
    pub tools: Vec<AgentTool>,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
    #[serde(default, alias = "is_main_router")]
    pub is_main_router: bool,
}

fn default_true() -> bool {
    true
}

impl Agent {
    /// Classification derived from the department name
    pub fn kind(&self) -> AgentKind {
        AgentKind::classify(&self.department)
    }

    /// Whether `user_id` owns this agent
    pub fn can_edit(&self, user_id: i64) -> bool {
        self.created_by == Some(user_id)
    }

    /// Tool identifiers enabled on this agent
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(rename = "message")]
    pub text: String,
    /// Omitted for the first message of a new conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
}

/// The assistant part of a chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    #[serde(alias = "response")]
    pub text: String,
    #[serde(default, alias = "agent_name")]
    pub agent_name: Option<String>,
    #[serde(default, alias = "execution_steps", alias = "executionDetails")]
    pub execution_steps: Vec<ExecutionStep>,
}

/// Response of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    #[serde(alias = "sessionId", alias = "session_id")]
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub title: Option<String>,
    pub message: AssistantReply,
    #[serde(default, alias = "agents_used")]
    pub agents_used: Vec<String>,
    #[serde(default, alias = "tools_used")]
    pub tools_used: Vec<String>,
    /// Server id for the user message, when the backend reports it
    #[serde(default)]
    pub user_message_id: Option<i64>,
    /// Server id for the assistant message, when the backend reports it
    #[serde(default)]
    pub message_id: Option<i64>,
}

impl SendResponse {
    /// Build the assistant message this response describes
    pub fn assistant_message(&self) -> Message {
        let mut message = Message::assistant(
            self.message.text.clone(),
            self.message.agent_name.clone(),
        );
        if let Some(id) = self.message_id {
            message.id = MessageId::Server(id);
        }
        message.execution_details = self.message.execution_steps.clone();
        message.agents_used = self.agents_used.clone();
        message.tools_used = self.tools_used.clone();
        message
    }
}

/// Parameters of `GET /api/conversations`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationQuery {
    /// Search text; `None` for the default most-recent-first listing
    pub query: Option<String>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl ConversationQuery {
    /// URL query pairs, skipping unset parameters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(q) = &self.query {
            params.push(("query", q.clone()));
        }
        if let Some(c) = &self.cursor {
            params.push(("cursor", c.clone()));
        }
        if let Some(l) = self.limit {
            params.push(("limit", l.to_string()));
        }
        params
    }
}

/// One page of conversations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    #[serde(alias = "conversations")]
    pub items: Vec<Conversation>,
    #[serde(default, alias = "next_cursor")]
    pub next_cursor: Option<String>,
}
