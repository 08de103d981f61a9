//! Store event types

use agentdesk_api::{AgentId, ConversationId};
use serde::{Deserialize, Serialize};

use crate::{error::ErrorKind, state::ConversationKey};

/// Store operation a surfaced error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Send,
    Delete,
    LoadHistory,
    Search,
    LoadMore,
    LoadAgents,
}

/// A dismissible, user-visible error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacedError {
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

/// Events emitted whenever a projection changes.
///
/// Presentation adapters subscribe and re-read the projections they render;
/// events carry identifiers, not state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// Conversation list contents or order changed
    ConversationsChanged,

    /// A different conversation (or a fresh draft) became active
    ActiveConversationChanged { key: ConversationKey },

    /// Message list of a conversation changed
    MessagesChanged { key: ConversationKey },

    /// A conversation moved to the top after a send; render a transient highlight
    ConversationPromoted { conversation_id: ConversationId },

    /// History fetch started / finished for a conversation
    HistoryLoading { conversation_id: ConversationId, loading: bool },

    /// A send was composed and dispatched
    SendStarted { key: ConversationKey },

    /// A send resolved (either way)
    SendFinished { key: ConversationKey, success: bool },

    /// A search request went out
    SearchStarted { query: Option<String> },

    /// The latest search resolved
    SearchFinished { query: Option<String> },

    /// A page fetch started / finished
    PageLoading { loading: bool },

    /// Agent list refreshed
    AgentsChanged,

    /// Target agent changed
    AgentSelected { agent_id: Option<AgentId> },

    /// A user-visible error was surfaced
    Error { error: SurfacedError },

    /// The surfaced error was dismissed
    ErrorDismissed,

    /// All state was cleared
    Reset,
}

impl StoreEvent {
    /// Whether the sidebar (conversation list) needs a redraw
    pub fn affects_sidebar(&self) -> bool {
        matches!(
            self,
            StoreEvent::ConversationsChanged
                | StoreEvent::ConversationPromoted { .. }
                | StoreEvent::ActiveConversationChanged { .. }
                | StoreEvent::SearchStarted { .. }
                | StoreEvent::SearchFinished { .. }
                | StoreEvent::PageLoading { .. }
                | StoreEvent::Reset
        )
    }
}
