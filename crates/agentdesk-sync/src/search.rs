//! Debounced conversation search
//!
//! Every search bumps the listing generation when it is issued, before its
//! debounce window. A search that finds the generation moved on once the
//! window has elapsed never reaches the network; a response that finds it
//! moved on is dropped. Together that gives switch semantics: only the most
//! recently issued query can land.

use agentdesk_api::ConversationQuery;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    events::{Operation, StoreEvent},
    store::{ConversationStore, guarded},
};

/// Result of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The listing now shows this query's first page
    Applied { count: usize },
    /// A newer search was issued; this one was dropped
    Superseded,
    /// The store was reset
    Stale,
}

/// `None` for a blank query, which means the default listing
fn normalize(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}

impl ConversationStore {
    /// Filter the conversation list, after the configured debounce.
    pub async fn search_conversations(&self, query: &str) -> Result<SearchOutcome> {
        let query = normalize(query);
        let session = self.session_token();
        let generation = self.next_generation();

        tokio::select! {
            _ = session.cancelled() => return Ok(SearchOutcome::Stale),
            _ = tokio::time::sleep(self.config().search_debounce) => {}
        }
        if self.state().listing_generation != generation {
            tracing::debug!("Search {:?} superseded during debounce", query);
            return Ok(SearchOutcome::Superseded);
        }

        self.fetch_listing(query, generation, &session).await
    }

    /// Load the first page of the unfiltered listing right away
    pub async fn reload_conversations(&self) -> Result<SearchOutcome> {
        let session = self.session_token();
        let generation = self.next_generation();
        self.fetch_listing(None, generation, &session).await
    }

    fn next_generation(&self) -> u64 {
        let mut state = self.state();
        state.listing_generation += 1;
        state.listing_generation
    }

    async fn fetch_listing(
        &self,
        query: Option<String>,
        generation: u64,
        session: &CancellationToken,
    ) -> Result<SearchOutcome> {
        {
            let mut state = self.state();
            state.searching = true;
            self.emit(StoreEvent::SearchStarted {
                query: query.clone(),
            });
        }

        let request = ConversationQuery {
            query: query.clone(),
            cursor: None,
            limit: Some(self.config().page_size),
        };
        tracing::debug!("Listing conversations for {:?}", query);
        let result = guarded(session, self.gateway().list_conversations(request)).await;
        if matches!(result, Err(Error::Stale)) {
            return Ok(SearchOutcome::Stale);
        }

        let mut state = self.state();
        if state.listing_generation != generation {
            tracing::debug!("Dropping listing for {:?}, a newer search was issued", query);
            return Ok(SearchOutcome::Superseded);
        }
        state.searching = false;
        self.emit(StoreEvent::SearchFinished {
            query: query.clone(),
        });

        match result {
            Ok(page) => {
                let count = state.replace_listing(query, page);
                self.emit(StoreEvent::ConversationsChanged);
                Ok(SearchOutcome::Applied { count })
            }
            Err(e) => {
                self.surface(&mut state, Operation::Search, &e);
                Err(e)
            }
        }
    }
}
