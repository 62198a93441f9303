//! Notes service
//!
//! Sequences the multi-row writes behind saving, updating and deleting a
//! note, and hands out the live queries the presentation layer renders from.
//! Each save or update is a single store transaction.

use crate::database::{now_millis, Attachment, AttachmentsQuery, Note, NotesQuery, Repository};
use crate::error::Result;

/// Service for managing notes and their attachment rows
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Live listing of all notes, pinned first then newest first
    pub fn observe_notes(&self) -> NotesQuery {
        self.repo.observe_notes()
    }

    /// Live listing of every attachment row
    pub fn observe_attachments(&self) -> AttachmentsQuery {
        self.repo.observe_attachments()
    }

    /// Live listing of the attachments owned by one note
    pub fn get_attachments(&self, note_id: i64) -> AttachmentsQuery {
        self.repo.observe_attachments_for(note_id)
    }

    /// Insert a new note together with one attachment row per distinct URI.
    ///
    /// Returns `None` without touching the store when both title and content
    /// are blank.
    pub async fn save_note(
        &self,
        title: &str,
        content: &str,
        pinned: bool,
        title_size: i64,
        content_size: i64,
        attachment_uris: &[String],
    ) -> Result<Option<i64>> {
        let note = Note {
            id: 0,
            title: title.to_string(),
            content: content.to_string(),
            is_priority: pinned,
            timestamp: now_millis(),
            title_size,
            content_size,
        };

        if !note.has_text() {
            tracing::debug!("Discarding blank note");
            return Ok(None);
        }

        let uris = distinct(attachment_uris);

        let mut tx = self.repo.begin().await?;
        let note_id = tx.insert_note(&note).await?;
        for uri in &uris {
            tx.insert_attachment(&attachment_row(note_id, uri)).await?;
        }
        tx.commit().await?;

        tracing::info!("Note created: {} ({} attachments)", note_id, uris.len());
        Ok(Some(note_id))
    }

    /// Overwrite an existing note and replace its whole attachment set.
    ///
    /// The note is stamped with the current time. Returns `false` without
    /// touching the store when both title and content are blank.
    pub async fn update_note(&self, note: &Note, attachment_uris: &[String]) -> Result<bool> {
        if !note.has_text() {
            tracing::debug!("Skipping update of note {} with blank text", note.id);
            return Ok(false);
        }

        let note = Note {
            timestamp: now_millis(),
            ..note.clone()
        };
        let uris = distinct(attachment_uris);

        let mut tx = self.repo.begin().await?;
        tx.insert_note(&note).await?;
        tx.delete_attachments_for(note.id).await?;
        for uri in &uris {
            tx.insert_attachment(&attachment_row(note.id, uri)).await?;
        }
        tx.commit().await?;

        tracing::info!("Note updated: {} ({} attachments)", note.id, uris.len());
        Ok(true)
    }

    /// Overwrite an existing note, keep its stored attachments and add any of
    /// `added_uris` it does not have yet.
    ///
    /// Used when the editor closed before the stored list reached it. Blank
    /// text is skipped the same way as in `update_note`.
    pub async fn update_note_keeping_attachments(
        &self,
        note: &Note,
        added_uris: &[String],
    ) -> Result<bool> {
        if !note.has_text() {
            tracing::debug!("Skipping update of note {} with blank text", note.id);
            return Ok(false);
        }

        let note = Note {
            timestamp: now_millis(),
            ..note.clone()
        };

        let mut tx = self.repo.begin().await?;
        tx.insert_note(&note).await?;
        let stored = tx.attachment_uris_for(note.id).await?;
        let mut appended = 0;
        for uri in distinct(added_uris) {
            if !stored.contains(&uri) {
                tx.insert_attachment(&attachment_row(note.id, &uri)).await?;
                appended += 1;
            }
        }
        tx.commit().await?;

        tracing::info!(
            "Note updated: {} (kept {} attachments, added {})",
            note.id,
            stored.len(),
            appended
        );
        Ok(true)
    }

    /// Delete a note; the store cascades the delete to its attachments.
    /// Image files on disk are left in place.
    pub async fn delete_note(&self, note: &Note) -> Result<()> {
        tracing::info!("Deleting note: {}", note.id);
        self.repo.delete_note(note).await
    }
}

/// Case-insensitive substring match against title or content.
/// An empty query matches every note.
pub fn matches_query(note: &Note, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let query_lower = query.to_lowercase();
    note.title.to_lowercase().contains(&query_lower)
        || note.content.to_lowercase().contains(&query_lower)
}

pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    notes
        .iter()
        .filter(|note| matches_query(note, query))
        .cloned()
        .collect()
}

/// First occurrence of each URI, in order
pub fn distinct(uris: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    uris.iter()
        .filter(|uri| seen.insert(uri.as_str()))
        .cloned()
        .collect()
}

fn attachment_row(note_id: i64, uri: &str) -> Attachment {
    Attachment {
        id: 0,
        note_id,
        file_uri: uri.to_string(),
    }
}
