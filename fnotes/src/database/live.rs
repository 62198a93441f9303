//! Live queries
//!
//! A live query emits the current rows on its first `next()` and then once
//! per committed change to its table. Changes that land while the consumer is
//! busy are coalesced into a single emission of the latest rows.

use super::models::{Attachment, Note};
use super::repository::Repository;
use crate::error::Result;
use tokio::sync::watch;

/// Tracks whether the rows held by the consumer are out of date.
/// Survives a cancelled `next()`: a change that was observed but not yet
/// reloaded stays pending.
struct Trigger {
    rx: watch::Receiver<u64>,
    stale: bool,
}

impl Trigger {
    fn new(rx: watch::Receiver<u64>) -> Self {
        Self { rx, stale: true }
    }

    /// Wait until a reload is due
    async fn wait(&mut self) {
        if !self.stale {
            // the query's repository keeps the sender alive, so this cannot close
            let _ = self.rx.changed().await;
            self.stale = true;
        }
    }

    fn poll(&mut self) -> bool {
        if !self.stale && self.rx.has_changed().unwrap_or(false) {
            self.rx.borrow_and_update();
            self.stale = true;
        }
        self.stale
    }

    /// A reload is starting; changes from here on make it stale again
    fn begin(&mut self) {
        self.rx.borrow_and_update();
    }

    fn settle(&mut self) {
        self.stale = false;
    }
}

/// All notes in listing order
pub struct NotesQuery {
    repo: Repository,
    trigger: Trigger,
}

impl NotesQuery {
    pub(crate) fn new(repo: Repository, rx: watch::Receiver<u64>) -> Self {
        Self {
            repo,
            trigger: Trigger::new(rx),
        }
    }

    /// Wait for the next emission
    pub async fn next(&mut self) -> Result<Vec<Note>> {
        self.trigger.wait().await;
        self.load().await
    }

    /// Emit only if the rows changed since the last emission
    pub async fn try_next(&mut self) -> Result<Option<Vec<Note>>> {
        if !self.trigger.poll() {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    async fn load(&mut self) -> Result<Vec<Note>> {
        self.trigger.begin();
        let notes = self.repo.list_notes().await?;
        self.trigger.settle();
        Ok(notes)
    }
}

/// All attachments, or the attachments of one note
pub struct AttachmentsQuery {
    repo: Repository,
    trigger: Trigger,
    note_id: Option<i64>,
}

impl AttachmentsQuery {
    pub(crate) fn new(repo: Repository, rx: watch::Receiver<u64>, note_id: Option<i64>) -> Self {
        Self {
            repo,
            trigger: Trigger::new(rx),
            note_id,
        }
    }

    pub fn note_id(&self) -> Option<i64> {
        self.note_id
    }

    pub async fn next(&mut self) -> Result<Vec<Attachment>> {
        self.trigger.wait().await;
        self.load().await
    }

    pub async fn try_next(&mut self) -> Result<Option<Vec<Attachment>>> {
        if !self.trigger.poll() {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    async fn load(&mut self) -> Result<Vec<Attachment>> {
        self.trigger.begin();
        let attachments = match self.note_id {
            Some(note_id) => self.repo.list_attachments_for(note_id).await?,
            None => self.repo.list_attachments().await?,
        };
        self.trigger.settle();
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use crate::database::{create_memory_pool, Attachment, Note, Repository};

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_first_emission_is_immediate() {
        let repo = create_test_repo().await;
        repo.insert_note(&Note::new("a", "b")).await.unwrap();

        let mut query = repo.observe_notes();
        let notes = query.next().await.unwrap();
        assert_eq!(notes.len(), 1);

        assert!(query.try_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_emits_after_commit() {
        let repo = create_test_repo().await;
        let mut query = repo.observe_notes();
        assert!(query.next().await.unwrap().is_empty());

        repo.insert_note(&Note::new("a", "b")).await.unwrap();
        repo.insert_note(&Note::new("c", "d")).await.unwrap();

        // both writes coalesce into one emission
        let notes = query.try_next().await.unwrap().unwrap();
        assert_eq!(notes.len(), 2);
        assert!(query.try_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_wakes_on_change() {
        let repo = create_test_repo().await;
        let mut query = repo.observe_notes();
        query.next().await.unwrap();

        let writer = repo.clone();
        let handle = tokio::spawn(async move {
            writer.insert_note(&Note::new("later", "x")).await.unwrap();
        });

        let notes = query.next().await.unwrap();
        assert_eq!(notes[0].title, "later");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_scoped_attachments_and_cascade() {
        let repo = create_test_repo().await;
        let id = repo.insert_note(&Note::new("a", "b")).await.unwrap();
        let other = repo.insert_note(&Note::new("c", "d")).await.unwrap();

        let mut scoped = repo.observe_attachments_for(id);
        assert_eq!(scoped.note_id(), Some(id));
        assert!(scoped.next().await.unwrap().is_empty());

        for note_id in [id, other] {
            repo.insert_attachment(&Attachment {
                id: 0,
                note_id,
                file_uri: format!("/img-{note_id}.jpg"),
            })
            .await
            .unwrap();
        }

        let rows = scoped.try_next().await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].note_id, id);

        let note = repo.get_note(id).await.unwrap();
        repo.delete_note(&note).await.unwrap();
        assert!(scoped.try_next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attachment_writes_do_not_wake_notes() {
        let repo = create_test_repo().await;
        let id = repo.insert_note(&Note::new("a", "b")).await.unwrap();

        let mut notes = repo.observe_notes();
        notes.next().await.unwrap();

        repo.insert_attachment(&Attachment {
            id: 0,
            note_id: id,
            file_uri: "/x.jpg".to_string(),
        })
        .await
        .unwrap();

        assert!(notes.try_next().await.unwrap().is_none());
    }
}
