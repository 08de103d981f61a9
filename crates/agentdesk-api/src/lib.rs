//! agentdesk-api: entity model and HTTP client for the agentdesk backend
//!
//! This crate holds the value types shared by every agentdesk surface
//! (conversations, messages, agents, execution steps), the wire shapes of
//! the chat endpoints, and a thin `reqwest` client for talking to them.

pub mod client;
pub mod department;
pub mod error;
pub mod grouping;
pub mod types;

pub use client::Client;
pub use department::AgentKind;
pub use error::{Error, Result};
pub use grouping::{ConversationGroup, DateGroup, group_conversations};
pub use types::*;
