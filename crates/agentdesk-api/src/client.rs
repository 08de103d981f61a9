//! HTTP client for the chat backend

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    types::{Agent, ConversationId, ConversationPage, ConversationQuery, Message, SendRequest, SendResponse},
};

/// Environment variable consulted by [`Client::from_env`]
pub const BASE_URL_ENV: &str = "AGENTDESK_BASE_URL";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Agent listing comes back either bare or wrapped with a total.
#[derive(Deserialize)]
#[serde(untagged)]
enum AgentsBody {
    List(Vec<Agent>),
    Wrapped { agents: Vec<Agent> },
    Data { data: Vec<Agent> },
}

/// History comes back either bare or wrapped with the session id.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessagesBody {
    List(Vec<Message>),
    Wrapped { messages: Vec<Message> },
}

/// Thin request/response client. Holds no state beyond the connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a client for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Create from the `AGENTDESK_BASE_URL` environment variable
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| Error::InvalidUrl(format!("{BASE_URL_ENV} is not set")))?;
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/chat`
    pub async fn send_message(&self, request: &SendRequest) -> Result<SendResponse> {
        let url = self.url("/api/chat");
        tracing::debug!(
            "POST {} (conversation: {:?}, agent: {:?})",
            url,
            request.conversation_id,
            request.agent_id
        );
        let response = self.http.post(&url).json(request).send().await?;
        decode(response).await
    }

    /// `GET /api/conversations`
    pub async fn list_conversations(&self, query: &ConversationQuery) -> Result<ConversationPage> {
        let url = self.url("/api/conversations");
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.http.get(&url).query(&query.to_params()).send().await?;
        decode(response).await
    }

    /// `GET /api/conversations/{id}/messages`
    pub async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        let url = self.url(&format!("/api/conversations/{conversation_id}/messages"));
        tracing::debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        Ok(match decode::<MessagesBody>(response).await? {
            MessagesBody::List(messages) | MessagesBody::Wrapped { messages } => messages,
        })
    }

    /// `DELETE /api/conversations/{id}`
    pub async fn delete_conversation(&self, conversation_id: ConversationId) -> Result<()> {
        let url = self.url(&format!("/api/conversations/{conversation_id}"));
        tracing::debug!("DELETE {}", url);
        let response = self.http.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// `GET /api/agents`
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let url = self.url("/api/agents");
        tracing::debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        Ok(match decode::<AgentsBody>(response).await? {
            AgentsBody::List(agents)
            | AgentsBody::Wrapped { agents }
            | AgentsBody::Data { data: agents } => agents,
        })
    }
}

/// Turn a non-success status into an `Error::Api`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::api(status.as_u16(), error_message(&body, status)))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": ...}` and `{"error": ...}` bodies; anything else
/// falls back to the (truncated) raw text or the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    trimmed.chars().take(200).collect()
}
