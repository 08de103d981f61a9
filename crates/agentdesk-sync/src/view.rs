//! Read-only projections of the store.
//!
//! Every accessor returns an owned snapshot so callers never hold the lock.

use agentdesk_api::{
    Agent, AgentKind, Conversation, ConversationGroup, ExecutionStep, Message, MessageId,
    group_conversations,
};
use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::{events::SurfacedError, state::ConversationKey, store::ConversationStore};

/// An agent that took part in the active conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub name: String,
    pub kind: AgentKind,
}

/// One execution step, attributed to the assistant message it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub message_id: MessageId,
    pub agent_name: Option<String>,
    pub step: ExecutionStep,
}

impl ConversationStore {
    pub fn conversations(&self) -> Vec<Conversation> {
        self.state().conversations.clone()
    }

    /// Messages of the active conversation
    pub fn messages(&self) -> Vec<Message> {
        self.state().active_messages().to_vec()
    }

    /// Cached messages of any conversation, active or not
    pub fn messages_for(&self, key: ConversationKey) -> Vec<Message> {
        self.state().histories.get(&key).cloned().unwrap_or_default()
    }

    pub fn active_key(&self) -> ConversationKey {
        self.state().active
    }

    /// The active conversation's row, if it is persisted and listed
    pub fn active_conversation(&self) -> Option<Conversation> {
        self.state().active_conversation().cloned()
    }

    /// History of the active conversation is being fetched
    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// A send is outstanding in the active conversation
    pub fn is_sending(&self) -> bool {
        self.state().is_sending()
    }

    pub fn is_searching(&self) -> bool {
        self.state().searching
    }

    pub fn is_loading_more(&self) -> bool {
        self.state().loading_more
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more()
    }

    /// Current search query; `None` for the default listing
    pub fn query(&self) -> Option<String> {
        self.state().query.clone()
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.state().agents.clone()
    }

    pub fn selected_agent(&self) -> Option<Agent> {
        self.state().selected_agent.clone()
    }

    pub fn last_error(&self) -> Option<SurfacedError> {
        self.state().last_error.clone()
    }

    /// Agents that answered in the active conversation, in order of first
    /// appearance. Kinds come from the cached agent list; unknown names are
    /// classed as general.
    pub fn participants(&self) -> Vec<Participant> {
        let state = self.state();
        let mut participants: Vec<Participant> = Vec::new();
        let names = state
            .active_messages()
            .iter()
            .filter(|m| m.is_assistant())
            .flat_map(|m| m.agent_name.iter().chain(m.agents_used.iter()));
        for name in names {
            if participants.iter().any(|p| &p.name == name) {
                continue;
            }
            let kind = state
                .agents
                .iter()
                .find(|a| &a.name == name)
                .map(Agent::kind)
                .unwrap_or(AgentKind::General);
            participants.push(Participant {
                name: name.clone(),
                kind,
            });
        }
        participants
    }

    /// Execution steps of the active conversation, flattened in message order
    pub fn execution_trace(&self) -> Vec<TraceEntry> {
        self.state()
            .active_messages()
            .iter()
            .filter(|m| m.is_assistant())
            .flat_map(|m| {
                m.execution_details.iter().map(|step| TraceEntry {
                    message_id: m.id,
                    agent_name: m.agent_name.clone(),
                    step: step.clone(),
                })
            })
            .collect()
    }

    /// Conversation list partitioned into date sections relative to `now`
    pub fn grouped_conversations<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<ConversationGroup> {
        group_conversations(&self.state().conversations, now)
    }
}
