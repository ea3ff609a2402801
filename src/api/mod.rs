//! Journal and chatbot service layer
//!
//! This module handles all interactions with the remote MindfulMe service:
//! - Listing and saving journal entries
//! - Exchanging chat messages with ZenBot
//! - Mapping transport and payload failures into `ApiError`

pub mod client;
pub mod error;

pub use client::HttpClient;
pub use error::ApiError;

use crate::types::{JournalEntry, SavedEntry};
use async_trait::async_trait;

/// Operations the UI needs from the remote service
#[async_trait]
pub trait MindfulApi: Send + Sync {
    /// Fetch every stored journal entry
    async fn list_entries(&self) -> Result<Vec<JournalEntry>, ApiError>;

    /// Store a new journal entry
    async fn save_entry(&self, content: &str) -> Result<SavedEntry, ApiError>;

    /// Send a message to the bot and return its reply
    async fn chat(&self, message: &str) -> Result<String, ApiError>;
}
