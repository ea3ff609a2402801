//! Core data types for mindfulme
//!
//! This module defines the shared data structures used throughout the application.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout the journal service stamps entries with
const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A dated journal record, owned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: String,
    pub content: String,
}

impl JournalEntry {
    /// Content shortened to at most `max_chars` characters for the list view
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_preview(&self.content, max_chars)
    }

    /// Format the date for display, falling back to the raw string
    pub fn formatted_date(&self) -> String {
        match NaiveDateTime::parse_from_str(&self.date, ENTRY_DATE_FORMAT) {
            Ok(date) => date.format("%d.%m.%y %H:%M").to_string(),
            Err(_) => self.date.clone(),
        }
    }
}

/// Success payload returned when an entry is stored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavedEntry {
    pub date: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SavedEntry {
    /// Calendar day of the saved entry (first ten characters of the stamp)
    pub fn day(&self) -> &str {
        match self.date.char_indices().nth(10) {
            Some((idx, _)) => &self.date[..idx],
            None => &self.date,
        }
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "ZenBot",
        }
    }
}

/// A single line of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into() }
    }
}

/// Rendered state of the journal entry list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntriesView {
    #[default]
    Loading,
    Empty,
    Loaded(Vec<JournalEntry>),
    Failed,
}

impl EntriesView {
    /// Build the view from a successful fetch
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        if entries.is_empty() {
            EntriesView::Empty
        } else {
            EntriesView::Loaded(entries)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntriesView::Loaded(entries) => entries.len(),
            _ => 0,
        }
    }
}

/// Application tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Journal,
    Chat,
    Settings,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Journal, Tab::Chat, Tab::Settings]
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Journal => 0,
            Tab::Chat => 1,
            Tab::Settings => 2,
        }
    }

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Tab::Journal,
            1 => Tab::Chat,
            2 => Tab::Settings,
            _ => Tab::Journal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Journal => "Journal",
            Tab::Chat => "ZenBot",
            Tab::Settings => "Settings",
        }
    }

    pub fn next(&self) -> Self {
        Tab::from_index((self.index() + 1) % Tab::all().len())
    }

    pub fn previous(&self) -> Self {
        let count = Tab::all().len();
        Tab::from_index((self.index() + count - 1) % count)
    }
}

// Helper functions

/// Truncate text to `max_chars` characters, marking the cut with "..."
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
