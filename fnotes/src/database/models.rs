//! Database models
//!
//! Rust structs representing the two persisted tables.

use crate::config::{DEFAULT_CONTENT_SIZE, DEFAULT_TITLE_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A text note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Note {
    /// Store-assigned id; `0` means "not yet persisted"
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Pinned notes sort before all others
    pub is_priority: bool,
    /// Unix epoch milliseconds of the last save
    pub timestamp: i64,
    pub title_size: i64,
    pub content_size: i64,
}

impl Note {
    /// A note that has not been inserted yet
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            is_priority: false,
            timestamp: now_millis(),
            title_size: DEFAULT_TITLE_SIZE,
            content_size: DEFAULT_CONTENT_SIZE,
        }
    }

    /// Whether the note carries anything worth persisting
    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.content.trim().is_empty()
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }
}

/// Image file referenced by exactly one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub note_id: i64,
    /// Absolute path of the app-private copy
    pub file_uri: String,
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
