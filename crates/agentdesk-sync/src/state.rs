//! Store state: conversation list, per-conversation histories, and request bookkeeping.

use std::collections::{HashMap, HashSet};

use agentdesk_api::{Agent, Conversation, ConversationId, ConversationPage, Message};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    events::{Operation, SurfacedError},
};

/// Identifies a message history: a persisted conversation, or a local draft
/// that has not been sent yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ConversationKey {
    Persisted(ConversationId),
    Draft(u64),
}

impl ConversationKey {
    pub fn conversation_id(&self) -> Option<ConversationId> {
        match self {
            ConversationKey::Persisted(id) => Some(*id),
            ConversationKey::Draft(_) => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, ConversationKey::Draft(_))
    }
}

/// A row removed optimistically while its delete request is in flight
#[derive(Debug, Clone)]
pub(crate) struct PendingDelete {
    pub index: usize,
    pub conversation: Conversation,
}

/// Everything the store owns. Only ever touched under the store's lock.
#[derive(Debug)]
pub(crate) struct StoreState {
    // --- sidebar ---
    pub conversations: Vec<Conversation>,
    pub next_cursor: Option<String>,
    /// Whether the first page of the current listing has arrived
    pub listing_loaded: bool,
    pub query: Option<String>,
    /// Bumped by every search and again whenever a listing is replaced; page
    /// responses from an older generation are dropped
    pub listing_generation: u64,
    pub searching: bool,
    pub loading_more: bool,
    pub pending_deletes: HashMap<ConversationId, PendingDelete>,

    // --- messages ---
    pub active: ConversationKey,
    next_draft: u64,
    pub histories: HashMap<ConversationKey, Vec<Message>>,
    pub sending: HashSet<ConversationKey>,
    /// Latest history request per conversation
    pub history_requests: HashMap<ConversationId, u64>,
    next_request: u64,

    // --- agents ---
    pub agents: Vec<Agent>,
    pub selected_agent: Option<Agent>,

    pub last_error: Option<SurfacedError>,
}

impl Default for StoreState {
    fn default() -> Self {
        let active = ConversationKey::Draft(0);
        Self {
            conversations: Vec::new(),
            next_cursor: None,
            listing_loaded: false,
            query: None,
            listing_generation: 0,
            searching: false,
            loading_more: false,
            pending_deletes: HashMap::new(),
            active,
            next_draft: 1,
            histories: HashMap::from([(active, Vec::new())]),
            sending: HashSet::new(),
            history_requests: HashMap::new(),
            next_request: 0,
            agents: Vec::new(),
            selected_agent: None,
            last_error: None,
        }
    }
}

impl StoreState {
    pub fn active_messages(&self) -> &[Message] {
        self.histories
            .get(&self.active)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active.conversation_id()?;
        self.conversations.iter().find(|c| c.id == Some(id))
    }

    pub fn is_sending(&self) -> bool {
        self.sending.contains(&self.active)
    }

    /// History for the active conversation is being fetched
    pub fn is_loading(&self) -> bool {
        self.active
            .conversation_id()
            .is_some_and(|id| self.history_requests.contains_key(&id))
    }

    pub fn has_more(&self) -> bool {
        !self.listing_loaded || self.next_cursor.is_some()
    }

    /// Switch to a fresh draft. The previous draft is dropped unless a send
    /// for it is still outstanding (its response must have somewhere to land).
    pub fn new_draft(&mut self) -> ConversationKey {
        if self.active.is_draft() && !self.sending.contains(&self.active) {
            self.histories.remove(&self.active);
        }
        let key = ConversationKey::Draft(self.next_draft);
        self.next_draft += 1;
        self.histories.insert(key, Vec::new());
        self.active = key;
        key
    }

    /// Register a history request for `id`, superseding earlier ones
    pub fn begin_history_request(&mut self, id: ConversationId) -> u64 {
        self.next_request += 1;
        self.history_requests.insert(id, self.next_request);
        self.next_request
    }

    /// Complete a history request. Returns false if a newer request for the
    /// same conversation was issued meanwhile.
    pub fn finish_history_request(&mut self, id: ConversationId, seq: u64) -> bool {
        if self.history_requests.get(&id) != Some(&seq) {
            return false;
        }
        self.history_requests.remove(&id);
        true
    }

    /// Replace a conversation's history with a server copy, keeping messages
    /// that exist only on this client: anything pending or failed, plus
    /// confirmed local messages the server copy does not contain yet.
    pub fn merge_history(&mut self, key: ConversationKey, fetched: Vec<Message>) -> usize {
        let newest = fetched.iter().map(|m| m.timestamp).max();
        let mut echoed: Vec<&Message> = fetched.iter().collect();
        let local: Vec<Message> = self
            .histories
            .remove(&key)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| {
                if !m.id.is_local() {
                    return false;
                }
                if m.is_unconfirmed() {
                    return true;
                }
                // a confirmed message the server now returns is replaced by its copy
                let echo = echoed
                    .iter()
                    .position(|f| f.is_user() == m.is_user() && f.text == m.text);
                if let Some(index) = echo {
                    echoed.swap_remove(index);
                    return false;
                }
                newest.is_none_or(|ts| m.timestamp > ts)
            })
            .collect();

        let mut merged = fetched;
        merged.extend(local);
        let len = merged.len();
        self.histories.insert(key, merged);
        len
    }

    /// Move (or insert) a conversation to the top of the list with a fresh timestamp.
    pub fn promote(&mut self, id: ConversationId, title: Option<String>, now: DateTime<Utc>) {
        let mut conversation = match self.conversations.iter().position(|c| c.id == Some(id)) {
            Some(index) => self.conversations.remove(index),
            None => Conversation::new(id, None, now),
        };
        conversation.timestamp = now;
        if title.is_some() {
            conversation.title = title;
        }
        self.conversations.insert(0, conversation);
    }

    /// Re-key a listed conversation the server moved to a new id. An existing
    /// row for the new id wins over the old one.
    pub fn rename_conversation(&mut self, from: ConversationId, to: ConversationId) {
        self.history_requests.remove(&from);
        let Some(index) = self.conversations.iter().position(|c| c.id == Some(from)) else {
            return;
        };
        if self.conversations.iter().any(|c| c.id == Some(to)) {
            self.conversations.remove(index);
        } else {
            self.conversations[index].id = Some(to);
        }
    }

    /// Replace the listing with the first page of a (new) query
    pub fn replace_listing(&mut self, query: Option<String>, page: ConversationPage) -> usize {
        let mut seen = HashSet::new();
        self.conversations = page
            .items
            .into_iter()
            .filter(|c| self.keep_listed(c, &mut seen))
            .collect();
        self.conversations
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.next_cursor = page.next_cursor;
        self.listing_loaded = true;
        self.query = query;
        // pages requested against the previous listing no longer line up
        self.listing_generation += 1;
        self.conversations.len()
    }

    /// Append a further page after the current tail
    pub fn append_page(&mut self, page: ConversationPage) -> usize {
        let mut seen: HashSet<ConversationId> =
            self.conversations.iter().filter_map(|c| c.id).collect();
        let before = self.conversations.len();
        for conv in page.items {
            if self.keep_listed(&conv, &mut seen) {
                self.conversations.push(conv);
            }
        }
        self.next_cursor = page.next_cursor;
        self.listing_loaded = true;
        self.conversations.len() - before
    }

    fn keep_listed(&self, conv: &Conversation, seen: &mut HashSet<ConversationId>) -> bool {
        match conv.id {
            Some(id) => !self.pending_deletes.contains_key(&id) && seen.insert(id),
            None => false,
        }
    }

    /// Remove a row and remember where it was
    pub fn remove_for_delete(&mut self, id: ConversationId) -> Option<()> {
        let index = self.conversations.iter().position(|c| c.id == Some(id))?;
        let mut conversation = self.conversations.remove(index);
        conversation.loading = true;
        self.pending_deletes
            .insert(id, PendingDelete { index, conversation });
        Some(())
    }

    /// Put a row back where it was after a failed delete, or at its timestamp
    /// position once rows around it have moved
    pub fn restore_deleted(&mut self, id: ConversationId) {
        if let Some(PendingDelete {
            index,
            mut conversation,
        }) = self.pending_deletes.remove(&id)
        {
            conversation.loading = false;
            let mut index = index.min(self.conversations.len());
            let fits = self.conversations[..index]
                .last()
                .is_none_or(|prev| prev.timestamp >= conversation.timestamp)
                && self.conversations[index..]
                    .first()
                    .is_none_or(|next| next.timestamp <= conversation.timestamp);
            if !fits {
                // the list moved on while the delete was out; keep it newest first
                index = self
                    .conversations
                    .partition_point(|c| c.timestamp >= conversation.timestamp);
            }
            self.conversations.insert(index, conversation);
        }
    }

    /// Record a user-visible error
    pub fn surface(&mut self, operation: Operation, error: &Error) -> SurfacedError {
        let surfaced = SurfacedError {
            operation,
            kind: error.kind(),
            message: error.to_string(),
        };
        self.last_error = Some(surfaced.clone());
        surfaced
    }
}
