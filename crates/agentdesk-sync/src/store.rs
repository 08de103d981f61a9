//! Conversation store: the single source of truth for chat state
//!
//! The store is a cheap, cloneable handle. Every clone sees the same state,
//! so presentation adapters each hold their own copy and call commands on it.
//! State sits behind a mutex that is never held across an `.await`; the only
//! suspension points are gateway requests.

use std::{future::Future, sync::Arc};

use agentdesk_api::{Agent, Conversation, ConversationId};
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    config::StoreConfig,
    error::{Error, Result},
    events::{Operation, StoreEvent},
    gateway::Gateway,
    state::{ConversationKey, StoreState},
};

/// Result of a history fetch triggered by `select_conversation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Merged into the active message list
    Loaded { count: usize },
    /// Arrived after the user switched away; stored against its own conversation
    Cached { count: usize },
    /// Superseded by a newer request or a reset; dropped
    Stale,
}

struct Inner {
    config: StoreConfig,
    gateway: Arc<dyn Gateway>,
    state: Mutex<StoreState>,
    event_tx: broadcast::Sender<StoreEvent>,
    /// Cancelled on `reset`; every request races against the token it started with
    session: Mutex<CancellationToken>,
}

/// The conversation store
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<Inner>,
}

impl ConversationStore {
    /// Create a new store
    pub fn new(config: StoreConfig, gateway: Arc<dyn Gateway>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                config,
                gateway,
                state: Mutex::new(StoreState::default()),
                event_tx,
                session: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Get the store config
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub(crate) fn gateway(&self) -> &dyn Gateway {
        self.inner.gateway.as_ref()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock()
    }

    pub(crate) fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.inner.event_tx.send(event);
    }

    pub(crate) fn session_token(&self) -> CancellationToken {
        self.inner.session.lock().clone()
    }

    /// Record and broadcast a user-visible error
    pub(crate) fn surface(&self, state: &mut StoreState, operation: Operation, error: &Error) {
        let surfaced = state.surface(operation, error);
        tracing::debug!("{:?} failed: {}", operation, surfaced.message);
        self.emit(StoreEvent::Error { error: surfaced });
    }

    /// Make `conversation` active and fetch its history.
    ///
    /// Any cached history is shown immediately. The response is merged only
    /// while the conversation is still active; otherwise it is cached under
    /// its own id. Of several requests for the same conversation, only the
    /// latest is applied.
    pub async fn select_conversation(&self, conversation: &Conversation) -> Result<HistoryOutcome> {
        let id = conversation
            .id
            .ok_or_else(|| Error::Validation("conversation has not been saved yet".into()))?;
        let key = ConversationKey::Persisted(id);
        let session = self.session_token();

        let seq = {
            let mut state = self.state();
            if state.active.is_draft() && !state.sending.contains(&state.active) {
                let draft = state.active;
                state.histories.remove(&draft);
            }
            state.active = key;
            state.histories.entry(key).or_default();
            let seq = state.begin_history_request(id);
            self.emit(StoreEvent::ActiveConversationChanged { key });
            self.emit(StoreEvent::MessagesChanged { key });
            self.emit(StoreEvent::HistoryLoading {
                conversation_id: id,
                loading: true,
            });
            seq
        };

        tracing::debug!("Fetching history for conversation {} (request {})", id, seq);
        let result = guarded(&session, self.gateway().get_messages(id)).await;

        if matches!(result, Err(Error::Stale)) {
            return Ok(HistoryOutcome::Stale);
        }
        let mut state = self.state();
        if !state.finish_history_request(id, seq) {
            tracing::debug!("Dropping superseded history response for conversation {}", id);
            return Ok(HistoryOutcome::Stale);
        }
        self.emit(StoreEvent::HistoryLoading {
            conversation_id: id,
            loading: false,
        });

        let is_active = state.active == key;
        match result {
            Ok(messages) => {
                let count = state.merge_history(key, messages);
                self.emit(StoreEvent::MessagesChanged { key });
                if is_active {
                    Ok(HistoryOutcome::Loaded { count })
                } else {
                    tracing::debug!(
                        "History for conversation {} arrived after switching away, cached",
                        id
                    );
                    Ok(HistoryOutcome::Cached { count })
                }
            }
            Err(e) if is_active => {
                self.surface(&mut state, Operation::LoadHistory, &e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    "History fetch for inactive conversation {} failed: {}",
                    id,
                    e
                );
                Ok(HistoryOutcome::Stale)
            }
        }
    }

    /// Switch to an empty, unsaved conversation. Nothing is sent until the
    /// first message.
    pub fn start_new_chat(&self) -> ConversationKey {
        let mut state = self.state();
        let key = state.new_draft();
        self.emit(StoreEvent::ActiveConversationChanged { key });
        self.emit(StoreEvent::MessagesChanged { key });
        key
    }

    /// Set the agent subsequent sends target. Messages are left alone.
    pub fn select_agent(&self, agent: Option<Agent>) {
        let mut state = self.state();
        let agent_id = agent.as_ref().map(|a| a.id);
        state.selected_agent = agent;
        self.emit(StoreEvent::AgentSelected { agent_id });
    }

    /// Refresh the cached agent list. Returns the number of agents now cached.
    ///
    /// A selected agent that disappeared from the listing is deselected; one
    /// that is still listed is replaced by its fresh copy.
    pub async fn load_agents(&self) -> Result<usize> {
        let session = self.session_token();
        let result = guarded(&session, self.gateway().list_agents()).await;

        let mut state = self.state();
        match result {
            Ok(agents) => {
                if let Some(selected) = state.selected_agent.take() {
                    let fresh = agents.iter().find(|a| a.id == selected.id).cloned();
                    if fresh.is_none() {
                        tracing::debug!("Selected agent {} no longer listed", selected.name);
                        self.emit(StoreEvent::AgentSelected { agent_id: None });
                    }
                    state.selected_agent = fresh;
                }
                state.agents = agents;
                self.emit(StoreEvent::AgentsChanged);
                Ok(state.agents.len())
            }
            Err(Error::Stale) => Ok(state.agents.len()),
            Err(e) => {
                self.surface(&mut state, Operation::LoadAgents, &e);
                Err(e)
            }
        }
    }

    /// Delete a conversation, removing it from the list before the request
    /// resolves. On failure the row is put back where it was.
    pub async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        let session = self.session_token();
        {
            let mut state = self.state();
            if state.pending_deletes.contains_key(&id) {
                return Ok(());
            }
            if state.remove_for_delete(id).is_none() {
                return Err(Error::Validation(format!(
                    "conversation {id} is not in the list"
                )));
            }
            self.emit(StoreEvent::ConversationsChanged);
        }

        tracing::debug!("Deleting conversation {}", id);
        let result = guarded(&session, self.gateway().delete_conversation(id)).await;

        let mut state = self.state();
        match result {
            Ok(()) => {
                state.pending_deletes.remove(&id);
                let key = ConversationKey::Persisted(id);
                state.histories.remove(&key);
                state.history_requests.remove(&id);
                if state.active == key {
                    let draft = state.new_draft();
                    self.emit(StoreEvent::ActiveConversationChanged { key: draft });
                    self.emit(StoreEvent::MessagesChanged { key: draft });
                }
                Ok(())
            }
            Err(Error::Stale) => Ok(()),
            Err(e) => {
                state.restore_deleted(id);
                self.emit(StoreEvent::ConversationsChanged);
                self.surface(&mut state, Operation::Delete, &e);
                Err(e)
            }
        }
    }

    /// Clear the surfaced error
    pub fn dismiss_error(&self) {
        let mut state = self.state();
        if state.last_error.take().is_some() {
            self.emit(StoreEvent::ErrorDismissed);
        }
    }

    /// Drop all state (logout / navigation away). Responses to requests
    /// issued before the reset are discarded.
    pub fn reset(&self) {
        {
            let mut session = self.inner.session.lock();
            session.cancel();
            *session = CancellationToken::new();
        }
        *self.state() = StoreState::default();
        self.emit(StoreEvent::Reset);
    }
}

/// Run a gateway request unless the session it belongs to is cancelled first.
pub(crate) async fn guarded<T>(
    session: &CancellationToken,
    request: impl Future<Output = agentdesk_api::Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = session.cancelled() => Err(Error::Stale),
        result = request => result.map_err(Error::from),
    }
}
