//! Presentation state machine
//!
//! Holds everything the UI renders: lock state, current screen, the note
//! dialog and its draft, and search. `Presenter::handle` applies one event
//! and returns the effects the session must carry out. It never touches the
//! store or the platform itself.

use super::draft::{Draft, SaveRequest, Step};
use crate::database::{Attachment, Note};
use crate::services::attachments::attachment_counts;
use crate::services::notes::filter_notes;
use crate::services::{AppSettings, ThemeMode};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Listing,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Notes hidden until the biometric prompt succeeds
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Search {
    pub active: bool,
    pub query: String,
}

/// Inputs to the presenter: user gestures and results delivered by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NotesLoaded(Vec<Note>),
    AttachmentsLoaded(Vec<Attachment>),
    /// Stored attachment list for the note being edited
    DraftAttachmentsLoaded { note_id: i64, uris: Vec<String> },
    ImagesImported(Vec<String>),
    AuthenticationFinished(bool),
    SettingsChanged(AppSettings),

    RetryUnlock,
    NewNote,
    EditNote(i64),
    TitleChanged(String),
    ContentChanged(String),
    TogglePin,
    StepTitleSize(Step),
    StepContentSize(Step),
    PickImages(Vec<PathBuf>),
    RemoveAttachment(String),
    OpenAttachment(String),
    ShareDraft,
    CopyDraft,
    Save,
    Cancel,
    /// Tap outside the dialog
    DismissDialog,
    DeleteNote,
    /// System back gesture
    Back,
    /// Toolbar up-arrow
    NavigateUp,
    ToggleSearch,
    SearchQueryChanged(String),
    OpenSettings,
    SetThemeMode(ThemeMode),
    SetBiometricLock(bool),
}

/// Work the session performs on behalf of the presenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Authenticate,
    Persist(SaveRequest),
    Delete(Note),
    LoadDraftAttachments(i64),
    ImportImages(Vec<PathBuf>),
    OpenAttachment(String),
    Share { title: String, content: String },
    Copy { title: String, content: String },
    FocusSearch,
    SaveThemeMode(ThemeMode),
    SaveBiometricLock(bool),
    /// Back was not consumed; leave it to the platform
    ExitApp,
}

pub struct Presenter {
    access: Access,
    screen: Screen,
    dialog: Option<Draft>,
    search: Search,
    notes: Vec<Note>,
    attachments: Vec<Attachment>,
    settings: AppSettings,
}

impl Presenter {
    /// Initial state for a fresh launch. Locked, with an authentication
    /// request, when the biometric lock is enabled.
    pub fn launch(settings: AppSettings) -> (Self, Vec<Effect>) {
        let (access, effects) = if settings.biometric_lock {
            (Access::Locked, vec![Effect::Authenticate])
        } else {
            (Access::Unlocked, Vec::new())
        };

        let presenter = Self {
            access,
            screen: Screen::Listing,
            dialog: None,
            search: Search::default(),
            notes: Vec::new(),
            attachments: Vec::new(),
            settings,
        };

        (presenter, effects)
    }

    // ===== Render state =====

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_locked(&self) -> bool {
        self.access == Access::Locked
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn settings(&self) -> AppSettings {
        self.settings
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.dialog.as_ref()
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn dialog_title(&self) -> Option<&'static str> {
        self.dialog.as_ref().map(|draft| match draft.editing {
            None => "New note",
            Some(_) => "Edit note",
        })
    }

    pub fn header_title(&self) -> &'static str {
        match self.screen {
            Screen::Listing => "Notes",
            Screen::Settings => "Settings",
        }
    }

    /// Notes to show on the listing: none while locked, otherwise the
    /// search-filtered store order
    pub fn visible_notes(&self) -> Vec<Note> {
        if self.is_locked() {
            return Vec::new();
        }
        filter_notes(&self.notes, &self.search.query)
    }

    pub fn attachment_counts(&self) -> HashMap<i64, usize> {
        attachment_counts(&self.attachments)
    }

    // ===== Transitions =====

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::NotesLoaded(notes) => {
                self.notes = notes;
                Vec::new()
            }
            Event::AttachmentsLoaded(attachments) => {
                self.attachments = attachments;
                Vec::new()
            }
            Event::SettingsChanged(settings) => {
                self.settings = settings;
                Vec::new()
            }
            Event::AuthenticationFinished(success) => {
                if success {
                    tracing::info!("Unlocked");
                    self.access = Access::Unlocked;
                } else {
                    tracing::info!("Authentication failed, staying locked");
                }
                Vec::new()
            }
            Event::RetryUnlock if self.is_locked() => vec![Effect::Authenticate],
            Event::Back if self.is_locked() => vec![Effect::ExitApp],
            _ if self.is_locked() => Vec::new(),
            event => self.handle_unlocked(event),
        }
    }

    fn handle_unlocked(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::NewNote => {
                if self.dialog.is_none() && self.screen == Screen::Listing {
                    self.dialog = Some(Draft::default());
                }
                Vec::new()
            }
            Event::EditNote(note_id) => self.open_editor(note_id),
            Event::Save | Event::DismissDialog => self.close_dialog_saving(),
            Event::Cancel => {
                self.dialog = None;
                Vec::new()
            }
            Event::DeleteNote => match self.dialog.as_ref().and_then(|d| d.editing.clone()) {
                Some(note) => {
                    self.dialog = None;
                    vec![Effect::Delete(note)]
                }
                None => Vec::new(),
            },
            Event::Back => {
                if self.dialog.is_some() {
                    self.close_dialog_saving()
                } else if self.search.active {
                    self.close_search();
                    Vec::new()
                } else if self.screen == Screen::Settings {
                    self.screen = Screen::Listing;
                    Vec::new()
                } else {
                    vec![Effect::ExitApp]
                }
            }
            Event::NavigateUp => {
                if self.search.active {
                    self.close_search();
                } else {
                    self.screen = Screen::Listing;
                }
                Vec::new()
            }
            Event::ToggleSearch => {
                if self.screen != Screen::Listing {
                    return Vec::new();
                }
                if self.search.active {
                    self.close_search();
                    Vec::new()
                } else {
                    self.search.active = true;
                    vec![Effect::FocusSearch]
                }
            }
            Event::SearchQueryChanged(query) => {
                if self.search.active {
                    self.search.query = query;
                }
                Vec::new()
            }
            Event::OpenSettings => {
                if self.dialog.is_none() {
                    self.screen = Screen::Settings;
                }
                Vec::new()
            }
            Event::SetThemeMode(mode) => {
                self.settings.theme_mode = mode;
                vec![Effect::SaveThemeMode(mode)]
            }
            Event::SetBiometricLock(enabled) => {
                self.settings.biometric_lock = enabled;
                vec![Effect::SaveBiometricLock(enabled)]
            }
            event => self.handle_draft(event),
        }
    }

    /// Events that only mean something while the dialog is open
    fn handle_draft(&mut self, event: Event) -> Vec<Effect> {
        let Some(draft) = self.dialog.as_mut() else {
            return Vec::new();
        };

        match event {
            Event::TitleChanged(title) => draft.title = title,
            Event::ContentChanged(content) => draft.content = content,
            Event::TogglePin => draft.pinned = !draft.pinned,
            Event::StepTitleSize(step) => draft.step_title_size(step),
            Event::StepContentSize(step) => draft.step_content_size(step),
            Event::RemoveAttachment(uri) => draft.remove_attachment(&uri),
            Event::ImagesImported(uris) => draft.add_attachments(uris),
            Event::DraftAttachmentsLoaded { note_id, uris } => {
                draft.hydrate(note_id, uris);
            }
            Event::PickImages(sources) if !sources.is_empty() => {
                return vec![Effect::ImportImages(sources)];
            }
            Event::OpenAttachment(uri) => return vec![Effect::OpenAttachment(uri)],
            Event::ShareDraft => {
                return vec![Effect::Share {
                    title: draft.title.clone(),
                    content: draft.content.clone(),
                }];
            }
            Event::CopyDraft => {
                return vec![Effect::Copy {
                    title: draft.title.clone(),
                    content: draft.content.clone(),
                }];
            }
            _ => {}
        }

        Vec::new()
    }

    fn open_editor(&mut self, note_id: i64) -> Vec<Effect> {
        if self.dialog.is_some() || self.screen != Screen::Listing {
            return Vec::new();
        }

        match self.notes.iter().find(|note| note.id == note_id) {
            Some(note) => {
                self.dialog = Some(Draft::from_note(note));
                vec![Effect::LoadDraftAttachments(note_id)]
            }
            None => {
                tracing::warn!("Cannot edit unknown note {}", note_id);
                Vec::new()
            }
        }
    }

    /// Shared by Save, tap-outside and back: persist unless blank, then close
    fn close_dialog_saving(&mut self) -> Vec<Effect> {
        match self.dialog.take().and_then(|draft| draft.save_request()) {
            Some(request) => vec![Effect::Persist(request)],
            None => Vec::new(),
        }
    }

    fn close_search(&mut self) {
        self.search.active = false;
        self.search.query.clear();
    }
}
