//! Application state and session driver
//!
//! `AppState` owns the services for one data directory. A `Session` binds
//! them to a `Presenter` and a `Platform`: UI events are applied on the
//! caller's task, store and settings work runs on a single worker task in
//! the order it was issued, file copies and prompts run as spawned tasks,
//! and live-query emissions flow back into the presenter.

use crate::config::AppConfig;
use crate::database::{create_pool, AttachmentsQuery, Note, NotesQuery, Repository};
use crate::error::Result;
use crate::platform::{BiometricPrompt, Platform};
use crate::presentation::{AttachmentEdit, Effect, Event, Presenter, SaveRequest};
use crate::services::{
    sharing, AppSettings, AttachmentsService, NotesService, SettingsService, ThemeMode,
};
use crate::storage::ImageStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub notes_service: NotesService,
    pub attachments_service: AttachmentsService,
    pub settings_service: SettingsService,
}

impl AppState {
    /// Open (or create) the store and settings under the configured data directory
    pub async fn open(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", config.data_dir());

        tokio::fs::create_dir_all(config.data_dir()).await?;
        let pool = create_pool(&config.database_path()).await?;

        Self::with_pool(config, pool).await
    }

    /// Build the services on an already initialized pool
    pub async fn with_pool(config: AppConfig, pool: SqlitePool) -> Result<Self> {
        let image_store = ImageStore::new(config.attachments_dir());
        image_store.initialize().await?;

        let settings_service = SettingsService::load(config.data_dir().to_path_buf()).await?;

        let state = Self {
            notes_service: NotesService::new(Repository::new(pool)),
            attachments_service: AttachmentsService::new(image_store),
            settings_service,
            config,
        };

        tracing::info!("Application initialized successfully");
        Ok(state)
    }
}

/// Whether the session should keep running after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Store and settings work, applied one at a time in the order issued
enum StoreOp {
    Persist(SaveRequest),
    Delete(Note),
    LoadDraftAttachments(i64),
    SaveThemeMode(ThemeMode),
    SaveBiometricLock(bool),
    /// Answered once every earlier op has been applied
    Barrier(oneshot::Sender<()>),
}

struct StoreWorker {
    notes: NotesService,
    settings: SettingsService,
    results: mpsc::UnboundedSender<Event>,
}

impl StoreWorker {
    async fn run(self, mut ops: mpsc::UnboundedReceiver<StoreOp>) {
        while let Some(op) = ops.recv().await {
            self.apply(op).await;
        }
        tracing::debug!("Store worker stopped");
    }

    async fn apply(&self, op: StoreOp) {
        match op {
            StoreOp::Persist(request) => {
                if let Err(e) = persist(&self.notes, request).await {
                    tracing::error!("Failed to save note: {}", e);
                }
            }
            StoreOp::Delete(note) => {
                if let Err(e) = self.notes.delete_note(&note).await {
                    tracing::error!("Failed to delete note {}: {}", note.id, e);
                }
            }
            StoreOp::LoadDraftAttachments(note_id) => {
                match self.notes.get_attachments(note_id).next().await {
                    Ok(rows) => self.emit(Event::DraftAttachmentsLoaded {
                        note_id,
                        uris: rows.into_iter().map(|a| a.file_uri).collect(),
                    }),
                    Err(e) => {
                        tracing::error!("Failed to load attachments of {}: {}", note_id, e)
                    }
                }
            }
            StoreOp::SaveThemeMode(mode) => {
                if let Err(e) = self.settings.set_theme_mode(mode).await {
                    tracing::error!("Failed to save theme mode: {}", e);
                    self.emit(Event::SettingsChanged(self.settings.current()));
                }
            }
            StoreOp::SaveBiometricLock(enabled) => {
                if let Err(e) = self.settings.set_biometric_lock(enabled).await {
                    tracing::error!("Failed to save biometric lock: {}", e);
                    self.emit(Event::SettingsChanged(self.settings.current()));
                }
            }
            StoreOp::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    fn emit(&self, event: Event) {
        // the session is gone; nothing left to update
        let _ = self.results.send(event);
    }
}

pub struct Session {
    state: AppState,
    platform: Arc<dyn Platform>,
    presenter: Presenter,
    notes_feed: NotesQuery,
    attachments_feed: AttachmentsQuery,
    settings_rx: watch::Receiver<AppSettings>,
    store: mpsc::UnboundedSender<StoreOp>,
    store_results: mpsc::UnboundedReceiver<Event>,
    /// Drained on shutdown so queued writes land
    store_worker: JoinHandle<()>,
    /// Prompts and image copies; abandoned on shutdown
    loads: JoinSet<Option<Event>>,
    focus_requested: bool,
}

impl Session {
    /// Start a session; prompts for authentication when the lock is enabled
    pub fn start(state: AppState, platform: Arc<dyn Platform>) -> Self {
        let settings = state.settings_service.current();
        let (presenter, effects) = Presenter::launch(settings);

        let (store, ops) = mpsc::unbounded_channel();
        let (results, store_results) = mpsc::unbounded_channel();
        let worker = StoreWorker {
            notes: state.notes_service.clone(),
            settings: state.settings_service.clone(),
            results,
        };
        let store_worker = tokio::spawn(worker.run(ops));

        let mut session = Self {
            notes_feed: state.notes_service.observe_notes(),
            attachments_feed: state.notes_service.observe_attachments(),
            settings_rx: state.settings_service.subscribe(),
            state,
            platform,
            presenter,
            store,
            store_results,
            store_worker,
            loads: JoinSet::new(),
            focus_requested: false,
        };

        for effect in effects {
            session.execute(effect);
        }

        session
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Whether the search field asked for input focus since the last call
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Apply one event. Never waits on the store.
    pub fn dispatch(&mut self, event: Event) -> Control {
        let mut control = Control::Continue;

        for effect in self.presenter.handle(event) {
            if self.execute(effect) == Control::Exit {
                control = Control::Exit;
            }
        }

        control
    }

    fn execute(&mut self, effect: Effect) -> Control {
        match effect {
            Effect::Authenticate => {
                let platform = Arc::clone(&self.platform);
                self.loads.spawn(async move {
                    let success = platform.authenticate(&BiometricPrompt::default()).await;
                    Some(Event::AuthenticationFinished(success))
                });
            }
            Effect::Persist(request) => self.send_store(StoreOp::Persist(request)),
            Effect::Delete(note) => self.send_store(StoreOp::Delete(note)),
            Effect::LoadDraftAttachments(note_id) => {
                self.send_store(StoreOp::LoadDraftAttachments(note_id))
            }
            Effect::ImportImages(sources) => {
                let attachments = self.state.attachments_service.clone();
                self.loads.spawn(async move {
                    let copied = attachments.import_images(&sources).await;
                    Some(Event::ImagesImported(copied))
                });
            }
            Effect::OpenAttachment(uri) => {
                self.state
                    .attachments_service
                    .open_attachment(self.platform.as_ref(), &uri);
            }
            Effect::Share { title, content } => {
                if let Err(e) = sharing::share_note(self.platform.as_ref(), &title, &content) {
                    tracing::error!("Share failed: {}", e);
                }
            }
            Effect::Copy { title, content } => {
                if let Err(e) = sharing::copy_note(self.platform.as_ref(), &title, &content) {
                    tracing::error!("Copy to clipboard failed: {}", e);
                }
            }
            Effect::FocusSearch => self.focus_requested = true,
            Effect::SaveThemeMode(mode) => self.send_store(StoreOp::SaveThemeMode(mode)),
            Effect::SaveBiometricLock(enabled) => {
                self.send_store(StoreOp::SaveBiometricLock(enabled))
            }
            Effect::ExitApp => return Control::Exit,
        }

        Control::Continue
    }

    fn send_store(&self, op: StoreOp) {
        if self.store.send(op).is_err() {
            tracing::error!("Store worker is not running, dropping store operation");
        }
    }

    fn apply_load(&mut self, joined: std::result::Result<Option<Event>, JoinError>) {
        match joined {
            Ok(Some(event)) => {
                self.dispatch(event);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Background task failed: {}", e),
        }
    }

    /// Wait until the store worker has applied everything queued so far
    async fn store_barrier(&self) {
        let (done, applied) = oneshot::channel();
        if self.store.send(StoreOp::Barrier(done)).is_ok() {
            let _ = applied.await;
        }
    }

    /// Pull any store or settings changes into the presenter without waiting.
    /// Returns whether anything was applied.
    pub async fn refresh(&mut self) -> Result<bool> {
        let mut applied = false;

        if let Some(notes) = self.notes_feed.try_next().await? {
            self.dispatch(Event::NotesLoaded(notes));
            applied = true;
        }
        if let Some(attachments) = self.attachments_feed.try_next().await? {
            self.dispatch(Event::AttachmentsLoaded(attachments));
            applied = true;
        }
        if self.settings_rx.has_changed().unwrap_or(false) {
            let settings = *self.settings_rx.borrow_and_update();
            self.dispatch(Event::SettingsChanged(settings));
            applied = true;
        }

        Ok(applied)
    }

    /// Wait for every in-flight task and queued store operation, apply their
    /// results and the resulting store changes, until nothing is left
    pub async fn flush(&mut self) -> Result<()> {
        loop {
            let mut applied = false;

            while let Some(joined) = self.loads.join_next().await {
                self.apply_load(joined);
                applied = true;
            }

            self.store_barrier().await;
            while let Ok(event) = self.store_results.try_recv() {
                self.dispatch(event);
                applied = true;
            }

            applied |= self.refresh().await?;

            if !applied && self.loads.is_empty() {
                return Ok(());
            }
        }
    }

    /// Drive the session from a stream of UI events until the stream ends
    /// or an event asks to exit. `render` runs after every state change.
    pub async fn run<F>(mut self, mut events: mpsc::Receiver<Event>, mut render: F) -> Result<()>
    where
        F: FnMut(&mut Session),
    {
        self.refresh().await?;
        render(&mut self);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if self.dispatch(event) == Control::Exit {
                        break;
                    }
                }
                Some(joined) = self.loads.join_next(), if !self.loads.is_empty() => {
                    self.apply_load(joined);
                }
                Some(event) = self.store_results.recv() => {
                    self.dispatch(event);
                }
                notes = self.notes_feed.next() => {
                    self.dispatch(Event::NotesLoaded(notes?));
                }
                attachments = self.attachments_feed.next() => {
                    self.dispatch(Event::AttachmentsLoaded(attachments?));
                }
                changed = self.settings_rx.changed() => {
                    if changed.is_ok() {
                        let settings = *self.settings_rx.borrow_and_update();
                        self.dispatch(Event::SettingsChanged(settings));
                    }
                }
            }

            render(&mut self);
        }

        tracing::info!("Session ending, waiting for queued store writes");
        let Session {
            store,
            store_worker,
            mut loads,
            ..
        } = self;

        loads.abort_all();
        drop(store);
        if let Err(e) = store_worker.await {
            tracing::error!("Store worker failed: {}", e);
        }

        Ok(())
    }
}

async fn persist(notes: &NotesService, request: SaveRequest) -> Result<()> {
    match request {
        SaveRequest::Create {
            title,
            content,
            pinned,
            title_size,
            content_size,
            attachment_uris,
        } => {
            notes
                .save_note(
                    &title,
                    &content,
                    pinned,
                    title_size,
                    content_size,
                    &attachment_uris,
                )
                .await?;
        }
        SaveRequest::Update {
            note,
            attachments: AttachmentEdit::Replace(uris),
        } => {
            notes.update_note(&note, &uris).await?;
        }
        SaveRequest::Update {
            note,
            attachments: AttachmentEdit::Append(added),
        } => {
            notes.update_note_keeping_attachments(&note, &added).await?;
        }
    }
    Ok(())
}
