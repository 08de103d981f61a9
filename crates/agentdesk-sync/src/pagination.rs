//! Infinite scroll over the conversation listing

use agentdesk_api::ConversationQuery;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    events::{Operation, StoreEvent},
    store::{ConversationStore, guarded},
};

/// Scroll position of the conversation list viewport, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Distance left to the bottom of the list
    pub fn remaining(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    pub fn is_near_bottom(&self, threshold_px: f64) -> bool {
        self.remaining() < threshold_px
    }
}

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// A page was fetched; `count` rows were new
    Appended { count: usize },
    /// Another page fetch is still outstanding
    Suppressed,
    /// The listing has no further pages
    Exhausted,
    /// Not close enough to the bottom
    NotNeeded,
    /// A search or reset replaced the listing while the page was in flight
    Stale,
}

impl ConversationStore {
    /// Fetch the page after the current cursor for the current query.
    pub async fn load_more(&self) -> Result<LoadMoreOutcome> {
        let session = self.session_token();
        let (generation, first_page, request) = {
            let mut state = self.state();
            if state.loading_more {
                return Ok(LoadMoreOutcome::Suppressed);
            }
            if !state.has_more() {
                return Ok(LoadMoreOutcome::Exhausted);
            }
            state.loading_more = true;
            self.emit(StoreEvent::PageLoading { loading: true });
            let request = ConversationQuery {
                query: state.query.clone(),
                cursor: state.next_cursor.clone(),
                limit: Some(self.config().page_size),
            };
            (state.listing_generation, !state.listing_loaded, request)
        };

        tracing::debug!("Loading page after cursor {:?}", request.cursor);
        let query = request.query.clone();
        let result = guarded(&session, self.gateway().list_conversations(request)).await;
        if matches!(result, Err(Error::Stale)) {
            return Ok(LoadMoreOutcome::Stale);
        }

        let mut state = self.state();
        state.loading_more = false;
        self.emit(StoreEvent::PageLoading { loading: false });
        if state.listing_generation != generation || state.query != query {
            tracing::debug!("Dropping page from an older listing");
            return Ok(LoadMoreOutcome::Stale);
        }

        match result {
            Ok(page) => {
                let count = if first_page {
                    state.replace_listing(query, page)
                } else {
                    state.append_page(page)
                };
                self.emit(StoreEvent::ConversationsChanged);
                Ok(LoadMoreOutcome::Appended { count })
            }
            Err(e) => {
                self.surface(&mut state, Operation::LoadMore, &e);
                Err(e)
            }
        }
    }

    /// Scroll handler: loads the next page once the viewport is within the
    /// configured threshold of the bottom.
    pub async fn on_scroll(&self, metrics: ScrollMetrics) -> Result<LoadMoreOutcome> {
        if !metrics.is_near_bottom(self.config().scroll_threshold_px) {
            return Ok(LoadMoreOutcome::NotNeeded);
        }
        self.load_more().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::StoreConfig,
        mock::{Call, MockGateway, conversation},
        search::SearchOutcome,
    };
    use std::{sync::Arc, time::Duration};

    fn make_store(gateway: MockGateway) -> (ConversationStore, Arc<MockGateway>) {
        let gateway = Arc::new(gateway);
        let store = ConversationStore::new(StoreConfig::default(), gateway.clone());
        (store, gateway)
    }

    fn list_calls(gateway: &MockGateway) -> usize {
        gateway
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    #[test]
    fn test_scroll_metrics() {
        let metrics = ScrollMetrics {
            scroll_top: 850.0,
            scroll_height: 1500.0,
            client_height: 600.0,
        };
        assert_eq!(metrics.remaining(), 50.0);
        assert!(metrics.is_near_bottom(100.0));
        assert!(!metrics.is_near_bottom(40.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_load_more_issues_one_request() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=45).map(|i| conversation(i, "chat")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();
        assert_eq!(store.conversations().len(), 20);
        gateway.delay_query(None, Duration::from_millis(100));

        let (first, second) = tokio::join!(store.load_more(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.load_more().await
        });

        assert_eq!(first.unwrap(), LoadMoreOutcome::Appended { count: 20 });
        assert_eq!(second.unwrap(), LoadMoreOutcome::Suppressed);
        assert_eq!(list_calls(&gateway), 2);
        assert_eq!(store.conversations().len(), 40);
        assert!(!store.is_loading_more());
    }

    #[tokio::test]
    async fn test_load_more_until_exhausted() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=25).map(|i| conversation(i, "chat")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();

        assert_eq!(
            store.load_more().await.unwrap(),
            LoadMoreOutcome::Appended { count: 5 }
        );
        assert!(!store.has_more());
        assert_eq!(store.load_more().await.unwrap(), LoadMoreOutcome::Exhausted);
        assert_eq!(list_calls(&gateway), 2);
    }

    #[tokio::test]
    async fn test_load_more_passes_cursor_and_query() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=30).map(|i| conversation(i, "budget")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();

        store.load_more().await.unwrap();

        assert_eq!(
            gateway.calls().last(),
            Some(&Call::List {
                query: None,
                cursor: Some("20".into())
            })
        );
    }

    #[tokio::test]
    async fn test_on_scroll_far_from_bottom_does_nothing() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=30).map(|i| conversation(i, "chat")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();

        let outcome = store
            .on_scroll(ScrollMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                client_height: 600.0,
            })
            .await
            .unwrap();

        assert_eq!(outcome, LoadMoreOutcome::NotNeeded);
        assert_eq!(list_calls(&gateway), 1);

        let outcome = store
            .on_scroll(ScrollMetrics {
                scroll_top: 1350.0,
                scroll_height: 2000.0,
                client_height: 600.0,
            })
            .await
            .unwrap();
        assert_eq!(outcome, LoadMoreOutcome::Appended { count: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_from_before_a_search_is_dropped() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=30).map(|i| conversation(i, "chat")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();
        gateway.delay_query(None, Duration::from_millis(500));

        let (page, search) = tokio::join!(store.load_more(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.search_conversations("chat").await
        });

        assert_eq!(page.unwrap(), LoadMoreOutcome::Stale);
        search.unwrap();
        assert_eq!(store.conversations().len(), 20);
        assert!(!store.is_loading_more());
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_requested_during_search_debounce_is_dropped() {
        let gateway = MockGateway::new();
        let mut rows: Vec<_> = (1..=30).map(|i| conversation(i, "chat")).collect();
        rows.push(conversation(31, "alpha plan"));
        gateway.seed_listing(rows);
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();
        gateway.delay_query(None, Duration::from_millis(500));

        let (search, page) = tokio::join!(store.search_conversations("alpha"), async {
            // inside the debounce window, before the search is on the wire
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.load_more().await
        });

        assert_eq!(search.unwrap(), SearchOutcome::Applied { count: 1 });
        assert_eq!(page.unwrap(), LoadMoreOutcome::Stale);
        let titles: Vec<_> = store
            .conversations()
            .iter()
            .map(|c| c.display_title().to_string())
            .collect();
        assert_eq!(titles, vec!["alpha plan"]);
        assert_eq!(store.query().as_deref(), Some("alpha"));
        assert!(!store.has_more());
        assert!(!store.is_loading_more());
    }

    #[tokio::test]
    async fn test_failed_page_surfaces_error() {
        let gateway = MockGateway::new();
        gateway.seed_listing((1..=30).map(|i| conversation(i, "chat")).collect());
        let (store, gateway) = make_store(gateway);
        store.reload_conversations().await.unwrap();
        gateway.fail_query(None, 500, "boom");

        assert!(store.load_more().await.is_err());
        assert_eq!(store.conversations().len(), 20);
        assert_eq!(store.last_error().unwrap().operation, Operation::LoadMore);
        assert!(!store.is_loading_more());
    }
}
