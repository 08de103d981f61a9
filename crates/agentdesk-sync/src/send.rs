//! Send/reconcile protocol
//!
//! A send goes through compose, dispatch, await and reconcile. Composing is
//! synchronous ([`ConversationStore::begin_send`]) so the user message is
//! visible before any network activity; [`PendingSend::dispatch`] covers the
//! rest. Responses are routed to the conversation the send was composed in,
//! whatever is active when they arrive.

use agentdesk_api::{ConversationId, Message, MessageId, MessageStatus, SendRequest};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    events::{Operation, StoreEvent},
    state::ConversationKey,
    store::{ConversationStore, guarded},
};

/// Result of a dispatched send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant replied; `created` is set when this send persisted a draft
    Delivered {
        conversation_id: ConversationId,
        created: bool,
    },
    /// The store was reset while the request was out
    Stale,
}

/// A composed message that has not been dispatched yet
#[must_use = "a pending send does nothing until dispatched"]
pub struct PendingSend {
    store: ConversationStore,
    key: ConversationKey,
    request: SendRequest,
    user_message_id: MessageId,
    session: CancellationToken,
}

impl PendingSend {
    /// Conversation the send was composed in
    pub fn key(&self) -> ConversationKey {
        self.key
    }

    /// Local id of the optimistic user message
    pub fn user_message_id(&self) -> MessageId {
        self.user_message_id
    }

    pub fn request(&self) -> &SendRequest {
        &self.request
    }

    /// Send the request and reconcile the response into the store
    pub async fn dispatch(self) -> Result<SendOutcome> {
        let store = &self.store;
        tracing::debug!(
            "Dispatching message in {:?} (agent {:?})",
            self.key,
            self.request.agent_id
        );
        let result = guarded(
            &self.session,
            store.gateway().send_message(self.request.clone()),
        )
        .await;

        let response = match result {
            Ok(response) => response,
            Err(Error::Stale) => return Ok(SendOutcome::Stale),
            Err(e) => {
                let mut state = store.state();
                state.sending.remove(&self.key);
                if let Some(message) = state
                    .histories
                    .get_mut(&self.key)
                    .and_then(|h| h.iter_mut().find(|m| m.id == self.user_message_id))
                {
                    message.status = MessageStatus::Failed;
                }
                store.emit(StoreEvent::MessagesChanged { key: self.key });
                store.emit(StoreEvent::SendFinished {
                    key: self.key,
                    success: false,
                });
                store.surface(&mut state, Operation::Send, &e);
                return Err(e);
            }
        };

        let conversation_id = response.conversation_id;
        let target = ConversationKey::Persisted(conversation_id);
        let mut state = store.state();
        state.sending.remove(&self.key);

        let mut history = state.histories.remove(&self.key).unwrap_or_default();
        if let Some(message) = history.iter_mut().find(|m| m.id == self.user_message_id) {
            message.status = MessageStatus::Sent;
            if let Some(id) = response.user_message_id {
                message.id = MessageId::Server(id);
            }
        }
        history.push(response.assistant_message());

        if target != self.key {
            tracing::debug!("{:?} is now conversation {}", self.key, conversation_id);
            if let ConversationKey::Persisted(previous) = self.key {
                state.rename_conversation(previous, conversation_id);
            }
            if let Some(mut existing) = state.histories.remove(&target) {
                existing.extend(history);
                history = existing;
            }
            if state.active == self.key {
                state.active = target;
                store.emit(StoreEvent::ActiveConversationChanged { key: target });
            }
        }
        state.histories.insert(target, history);
        state.promote(conversation_id, response.title.clone(), Utc::now());

        store.emit(StoreEvent::MessagesChanged { key: target });
        store.emit(StoreEvent::ConversationsChanged);
        store.emit(StoreEvent::ConversationPromoted { conversation_id });
        store.emit(StoreEvent::SendFinished {
            key: self.key,
            success: true,
        });

        Ok(SendOutcome::Delivered {
            conversation_id,
            created: self.key.is_draft(),
        })
    }
}

impl ConversationStore {
    /// Compose a message in the active conversation.
    ///
    /// The user message is appended right away with `Pending` status. Fails
    /// on blank text, or while another send in the same conversation is
    /// outstanding.
    pub fn begin_send(&self, text: &str) -> Result<PendingSend> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("message text is empty".into()));
        }
        let session = self.session_token();

        let mut state = self.state();
        let key = state.active;
        if state.sending.contains(&key) {
            return Err(Error::SendInFlight);
        }

        let message = Message::user(text);
        let user_message_id = message.id;
        state.histories.entry(key).or_default().push(message);
        state.sending.insert(key);

        let request = SendRequest {
            text: text.to_string(),
            conversation_id: key.conversation_id(),
            agent_id: state.selected_agent.as_ref().map(|a| a.id),
        };
        self.emit(StoreEvent::MessagesChanged { key });
        self.emit(StoreEvent::SendStarted { key });

        Ok(PendingSend {
            store: self.clone(),
            key,
            request,
            user_message_id,
            session,
        })
    }

    /// Compose and dispatch in one step
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        self.begin_send(text)?.dispatch().await
    }
}
