//! agentdesk-sync: conversation store for agentdesk clients
//!
//! [`ConversationStore`] owns the conversation list, per-conversation message
//! histories and the agent cache. Commands mutate it, gateway responses are
//! reconciled into it, and presentation adapters read snapshots and follow
//! [`StoreEvent`]s.
//!
//! Ordering rules:
//! - one outstanding send per conversation; send responses land in the
//!   conversation they were composed in
//! - history responses are tagged with conversation id and request sequence
//! - search and paging are last-issued-wins over a listing generation
//! - [`ConversationStore::reset`] invalidates everything in flight

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod pagination;
pub mod search;
pub mod send;
pub mod state;
pub mod store;
pub mod view;

#[cfg(test)]
mod mock;

pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use events::{Operation, StoreEvent, SurfacedError};
pub use gateway::{Gateway, HttpGateway, RetryConfig};
pub use pagination::{LoadMoreOutcome, ScrollMetrics};
pub use search::SearchOutcome;
pub use send::{PendingSend, SendOutcome};
pub use state::ConversationKey;
pub use store::{ConversationStore, HistoryOutcome};
pub use view::{Participant, TraceEntry};
