//! Repository layer for database operations
//!
//! Typed queries and mutations over the notes store, with no business rules.
//! Every mutation runs inside a `StoreTx`; observers of the touched tables
//! are notified once the transaction commits.

use super::live::{AttachmentsQuery, NotesQuery};
use super::models::*;
use crate::error::{AppError, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::watch;

/// Per-table generation counters bumped after every committed write
#[derive(Clone)]
pub(crate) struct ChangeFeed {
    notes: Arc<watch::Sender<u64>>,
    attachments: Arc<watch::Sender<u64>>,
}

impl ChangeFeed {
    fn new() -> Self {
        Self {
            notes: Arc::new(watch::channel(0).0),
            attachments: Arc::new(watch::channel(0).0),
        }
    }

    fn bump(sender: &watch::Sender<u64>) {
        sender.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub(crate) fn notes(&self) -> watch::Receiver<u64> {
        self.notes.subscribe()
    }

    pub(crate) fn attachments(&self) -> watch::Receiver<u64> {
        self.attachments.subscribe()
    }
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: ChangeFeed::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction
    pub async fn begin(&self) -> Result<StoreTx> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx {
            tx,
            changes: self.changes.clone(),
            touched_notes: false,
            touched_attachments: false,
        })
    }

    // ===== Observable queries =====

    /// All notes, pinned first, then most recently saved first
    pub fn observe_notes(&self) -> NotesQuery {
        NotesQuery::new(self.clone(), self.changes.notes())
    }

    pub fn observe_attachments(&self) -> AttachmentsQuery {
        AttachmentsQuery::new(self.clone(), self.changes.attachments(), None)
    }

    pub fn observe_attachments_for(&self, note_id: i64) -> AttachmentsQuery {
        AttachmentsQuery::new(self.clone(), self.changes.attachments(), Some(note_id))
    }

    // ===== Snapshots =====

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes
            ORDER BY is_priority DESC, timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    pub async fn get_note(&self, id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NoteNotFound(id))
    }

    pub async fn list_attachments(&self) -> Result<Vec<Attachment>> {
        let attachments =
            sqlx::query_as::<_, Attachment>("SELECT * FROM attachments ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(attachments)
    }

    pub async fn list_attachments_for(&self, note_id: i64) -> Result<Vec<Attachment>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE note_id = ? ORDER BY id ASC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    // ===== Single-statement mutations =====

    /// Insert a note, or overwrite the row with the same id. Returns the id.
    pub async fn insert_note(&self, note: &Note) -> Result<i64> {
        let mut tx = self.begin().await?;
        let id = tx.insert_note(note).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Insert an attachment, or overwrite the row with the same id. Returns the id.
    pub async fn insert_attachment(&self, attachment: &Attachment) -> Result<i64> {
        let mut tx = self.begin().await?;
        let id = tx.insert_attachment(attachment).await?;
        tx.commit().await?;
        Ok(id)
    }

    pub async fn delete_attachments_for(&self, note_id: i64) -> Result<u64> {
        let mut tx = self.begin().await?;
        let removed = tx.delete_attachments_for(note_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    /// Delete a note; its attachments go with it through the foreign key.
    pub async fn delete_note(&self, note: &Note) -> Result<()> {
        let mut tx = self.begin().await?;
        tx.delete_note(note.id).await?;
        tx.commit().await
    }
}

/// An open write transaction on the notes store
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
    changes: ChangeFeed,
    touched_notes: bool,
    touched_attachments: bool,
}

impl StoreTx {
    /// Upsert keyed by id; an id of `0` lets the store assign one.
    pub async fn insert_note(&mut self, note: &Note) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notes (id, title, content, is_priority, timestamp, title_size, content_size)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                is_priority = excluded.is_priority,
                timestamp = excluded.timestamp,
                title_size = excluded.title_size,
                content_size = excluded.content_size
            RETURNING id
            "#,
        )
        .bind(assigned_id(note.id))
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.is_priority)
        .bind(note.timestamp)
        .bind(note.title_size)
        .bind(note.content_size)
        .fetch_one(&mut *self.tx)
        .await?;

        self.touched_notes = true;
        tracing::debug!("Wrote note: {}", id);
        Ok(id)
    }

    pub async fn insert_attachment(&mut self, attachment: &Attachment) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT OR REPLACE INTO attachments (id, note_id, file_uri)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(assigned_id(attachment.id))
        .bind(attachment.note_id)
        .bind(&attachment.file_uri)
        .fetch_one(&mut *self.tx)
        .await?;

        self.touched_attachments = true;
        tracing::debug!("Wrote attachment: {} for note: {}", id, attachment.note_id);
        Ok(id)
    }

    /// URIs already attached to a note, oldest first
    pub async fn attachment_uris_for(&mut self, note_id: i64) -> Result<Vec<String>> {
        let uris = sqlx::query_scalar(
            "SELECT file_uri FROM attachments WHERE note_id = ? ORDER BY id ASC",
        )
        .bind(note_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(uris)
    }

    pub async fn delete_attachments_for(&mut self, note_id: i64) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM attachments WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        self.touched_attachments = true;
        tracing::debug!("Deleted {} attachments of note: {}", removed, note_id);
        Ok(removed)
    }

    /// Returns whether a row was removed
    pub async fn delete_note(&mut self, note_id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(note_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        self.touched_notes = true;
        self.touched_attachments = true;
        tracing::debug!("Deleted note: {}", note_id);
        Ok(rows > 0)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;

        if self.touched_notes {
            ChangeFeed::bump(&self.changes.notes);
        }
        if self.touched_attachments {
            ChangeFeed::bump(&self.changes.attachments);
        }

        Ok(())
    }
}

fn assigned_id(id: i64) -> Option<i64> {
    (id != 0).then_some(id)
}
