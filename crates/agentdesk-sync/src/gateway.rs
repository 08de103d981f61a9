//! Gateway abstraction for reaching the chat backend

use std::{future::Future, time::Duration};

use agentdesk_api::{
    Agent, Client, ConversationId, ConversationPage, ConversationQuery, Message, Result,
    SendRequest, SendResponse,
};
use async_trait::async_trait;

/// Retry configuration for idempotent requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Request/response access to the chat backend. Stateless; the store owns
/// all caching and ordering.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send a user message and wait for the assistant's reply
    async fn send_message(&self, request: SendRequest) -> Result<SendResponse>;

    /// One page of conversations, optionally filtered by a search query
    async fn list_conversations(&self, query: ConversationQuery) -> Result<ConversationPage>;

    /// Full message history of a conversation
    async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>>;

    /// Delete a conversation
    async fn delete_conversation(&self, conversation_id: ConversationId) -> Result<()>;

    /// All agents visible to the user
    async fn list_agents(&self) -> Result<Vec<Agent>>;
}

/// Gateway over the HTTP client. Reads are retried, writes never are.
pub struct HttpGateway {
    client: Client,
    retry_config: RetryConfig,
}

impl HttpGateway {
    /// Create a gateway over an existing client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut request: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut attempt = 0u32;
        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry_config.max_retries && e.is_retryable() => {
                    let delay = self.retry_config.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation,
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                        e,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send_message(&self, request: SendRequest) -> Result<SendResponse> {
        // Not idempotent: a retried send could produce a duplicate exchange.
        self.client.send_message(&request).await
    }

    async fn list_conversations(&self, query: ConversationQuery) -> Result<ConversationPage> {
        self.with_retry("list_conversations", || self.client.list_conversations(&query))
            .await
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        self.with_retry("get_messages", || self.client.get_messages(conversation_id))
            .await
    }

    async fn delete_conversation(&self, conversation_id: ConversationId) -> Result<()> {
        self.client.delete_conversation(conversation_id).await
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.with_retry("list_agents", || self.client.list_agents()).await
    }
}
