//! Draft of the note being created or edited

use crate::config::{
    DEFAULT_CONTENT_SIZE, DEFAULT_TITLE_SIZE, MAX_CONTENT_SIZE, MAX_TITLE_SIZE, MIN_CONTENT_SIZE,
    MIN_TITLE_SIZE,
};
use crate::database::Note;

/// Direction of a font-size stepper press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Down,
    Up,
}

/// Move `size` one point in `step`, staying put at the bounds
pub fn step_size(size: i64, step: Step, min: i64, max: i64) -> i64 {
    match step {
        Step::Down if size > min => size - 1,
        Step::Up if size < max => size + 1,
        _ => size,
    }
}

/// How an update treats the stored attachment rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentEdit {
    /// The complete new list
    Replace(Vec<String>),
    /// The stored list was never loaded into the draft: keep it and add these
    Append(Vec<String>),
}

/// What saving the draft asks of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    Create {
        title: String,
        content: String,
        pinned: bool,
        title_size: i64,
        content_size: i64,
        attachment_uris: Vec<String>,
    },
    Update {
        note: Note,
        attachments: AttachmentEdit,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub title_size: i64,
    pub content_size: i64,
    pub attachment_uris: Vec<String>,
    /// The stored note being edited; `None` for a new note
    pub editing: Option<Note>,
    hydrated: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            pinned: false,
            title_size: DEFAULT_TITLE_SIZE,
            content_size: DEFAULT_CONTENT_SIZE,
            attachment_uris: Vec::new(),
            editing: None,
            hydrated: true,
        }
    }
}

impl Draft {
    /// Copy of a stored note; its attachment list arrives later via `hydrate`
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            pinned: note.is_priority,
            title_size: note.title_size,
            content_size: note.content_size,
            attachment_uris: Vec::new(),
            editing: Some(note.clone()),
            hydrated: false,
        }
    }

    pub fn editing_id(&self) -> Option<i64> {
        self.editing.as_ref().map(|note| note.id)
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn step_title_size(&mut self, step: Step) {
        self.title_size = step_size(self.title_size, step, MIN_TITLE_SIZE, MAX_TITLE_SIZE);
    }

    pub fn step_content_size(&mut self, step: Step) {
        self.content_size = step_size(self.content_size, step, MIN_CONTENT_SIZE, MAX_CONTENT_SIZE);
    }

    pub fn add_attachments(&mut self, uris: impl IntoIterator<Item = String>) {
        for uri in uris {
            if !self.attachment_uris.contains(&uri) {
                self.attachment_uris.push(uri);
            }
        }
    }

    pub fn remove_attachment(&mut self, uri: &str) {
        self.attachment_uris.retain(|existing| existing != uri);
    }

    /// Apply the stored attachment list of the note being edited.
    ///
    /// Only the first list for this draft is applied. URIs added before it
    /// arrived are kept after the stored ones. Returns whether it was applied.
    pub fn hydrate(&mut self, note_id: i64, stored: Vec<String>) -> bool {
        if self.hydrated || self.editing_id() != Some(note_id) {
            return false;
        }

        let added = std::mem::replace(&mut self.attachment_uris, stored);
        self.add_attachments(added);
        self.hydrated = true;
        true
    }

    /// `None` when the draft is blank and must not be persisted.
    ///
    /// An edit saved before its stored attachments arrived only appends the
    /// URIs added in this session.
    pub fn save_request(&self) -> Option<SaveRequest> {
        if self.is_blank() {
            return None;
        }

        let request = match &self.editing {
            None => SaveRequest::Create {
                title: self.title.clone(),
                content: self.content.clone(),
                pinned: self.pinned,
                title_size: self.title_size,
                content_size: self.content_size,
                attachment_uris: self.attachment_uris.clone(),
            },
            Some(note) => SaveRequest::Update {
                note: Note {
                    title: self.title.clone(),
                    content: self.content.clone(),
                    is_priority: self.pinned,
                    title_size: self.title_size,
                    content_size: self.content_size,
                    ..note.clone()
                },
                attachments: if self.hydrated {
                    AttachmentEdit::Replace(self.attachment_uris.clone())
                } else {
                    AttachmentEdit::Append(self.attachment_uris.clone())
                },
            },
        };

        Some(request)
    }
}
