//! Integration tests for FNotes
//!
//! These tests drive a full session against a file-backed store:
//! - Creating, searching, editing and deleting notes
//! - Attachment import and replacement
//! - Biometric lock at launch
//! - Schema version handling across restarts

use fnotes::app::{AppState, Session};
use fnotes::config::AppConfig;
use fnotes::database::Note;
use fnotes::error::Result;
use fnotes::platform::{BiometricPrompt, ContentHandle, Platform};
use fnotes::presentation::{Event, Screen};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct FakePlatform {
    allow: AtomicBool,
    toasts: Mutex<Vec<String>>,
    clipboard: Mutex<Option<String>>,
    viewed: Mutex<Vec<PathBuf>>,
}

#[async_trait::async_trait]
impl Platform for FakePlatform {
    async fn authenticate(&self, _prompt: &BiometricPrompt) -> bool {
        self.allow.load(Ordering::SeqCst)
    }

    fn share_text(&self, _chooser_title: &str, _mime_type: &str, _text: &str) -> Result<()> {
        Ok(())
    }

    fn set_clipboard(&self, _label: &str, text: &str) -> Result<()> {
        *self.clipboard.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    fn show_toast(&self, message: &str) {
        self.toasts.lock().unwrap().push(message.to_string());
    }

    fn view(&self, handle: &ContentHandle) -> Result<()> {
        self.viewed.lock().unwrap().push(handle.path.clone());
        Ok(())
    }
}

/// Helper to open the app on a data directory
async fn open_state(data_dir: &TempDir) -> AppState {
    AppState::open(AppConfig::new(data_dir.path())).await.unwrap()
}

async fn start_session(state: AppState) -> (Session, Arc<FakePlatform>) {
    let platform = Arc::new(FakePlatform::default());
    let mut session = Session::start(state, platform.clone());
    session.flush().await.unwrap();
    (session, platform)
}

async fn write_note(session: &mut Session, title: &str, content: &str, pinned: bool) {
    session.dispatch(Event::NewNote);
    session.dispatch(Event::TitleChanged(title.to_string()));
    session.dispatch(Event::ContentChanged(content.to_string()));
    if pinned {
        session.dispatch(Event::TogglePin);
    }
    session.dispatch(Event::Save);
    session.flush().await.unwrap();
}

fn find_note(session: &Session, title: &str) -> Note {
    session
        .presenter()
        .visible_notes()
        .into_iter()
        .find(|note| note.title == title)
        .unwrap()
}

/// Helper to create a source image outside the data directory
async fn create_source_image(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, bytes).await.unwrap();
    path
}

#[tokio::test]
async fn test_create_search_and_order() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    write_note(&mut session, "Important", "pinned reminder", true).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    write_note(&mut session, "Groceries", "milk, eggs", false).await;

    let titles: Vec<String> = session
        .presenter()
        .visible_notes()
        .into_iter()
        .map(|note| note.title)
        .collect();
    assert_eq!(titles, vec!["Important", "Groceries"]);

    session.dispatch(Event::ToggleSearch);
    session.dispatch(Event::SearchQueryChanged("egg".to_string()));
    let visible = session.presenter().visible_notes();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Groceries");
    assert!(!visible[0].is_priority);

    // back clears the search before anything else
    session.dispatch(Event::Back);
    assert!(!session.presenter().search().active);
    assert_eq!(session.presenter().visible_notes().len(), 2);
}

#[tokio::test]
async fn test_dismiss_autosaves_edit() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    write_note(&mut session, "Groceries", "milk, eggs", false).await;
    let note = find_note(&session, "Groceries");

    session.dispatch(Event::EditNote(note.id));
    session.flush().await.unwrap();
    session.dispatch(Event::ContentChanged("milk, eggs, bread".to_string()));
    session.dispatch(Event::DismissDialog);
    session.flush().await.unwrap();

    assert!(!session.presenter().is_dialog_open());
    let stored = session
        .state()
        .notes_service
        .repository()
        .get_note(note.id)
        .await
        .unwrap();
    assert_eq!(stored.content, "milk, eggs, bread");
    assert!(stored.timestamp >= note.timestamp);
}

#[tokio::test]
async fn test_replace_attachments_keeps_one_row() {
    let data_dir = TempDir::new().unwrap();
    let pictures = TempDir::new().unwrap();
    let first = create_source_image(&pictures, "first.png", b"first").await;
    let second = create_source_image(&pictures, "second.png", b"second").await;

    let (mut session, platform) = start_session(open_state(&data_dir).await).await;

    session.dispatch(Event::NewNote);
    session.dispatch(Event::TitleChanged("Trip".to_string()));
    session.dispatch(Event::PickImages(vec![first, second]));
    session.flush().await.unwrap();

    let uris = session.presenter().draft().unwrap().attachment_uris.clone();
    assert_eq!(uris.len(), 2);
    let attachments_dir = session.state().config.attachments_dir();
    for uri in &uris {
        assert!(PathBuf::from(uri).starts_with(attachments_dir.canonicalize().unwrap()));
    }

    session.dispatch(Event::Save);
    session.flush().await.unwrap();

    let note = find_note(&session, "Trip");
    assert_eq!(session.presenter().attachment_counts().get(&note.id), Some(&2));

    session.dispatch(Event::EditNote(note.id));
    session.flush().await.unwrap();
    assert_eq!(session.presenter().draft().unwrap().attachment_uris, uris);

    session.dispatch(Event::OpenAttachment(uris[1].clone()));
    assert_eq!(*platform.viewed.lock().unwrap(), vec![PathBuf::from(&uris[1])]);
    assert!(platform.toasts.lock().unwrap().is_empty());

    session.dispatch(Event::RemoveAttachment(uris[0].clone()));
    session.dispatch(Event::Save);
    session.flush().await.unwrap();

    let rows = session
        .state()
        .notes_service
        .repository()
        .list_attachments_for(note.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_uri, uris[1]);

    // removed rows leave their files in place
    assert!(PathBuf::from(&uris[0]).exists());
}

#[tokio::test]
async fn test_quick_dismiss_keeps_stored_attachments() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    let uris = vec!["/a.jpg".to_string(), "/b.jpg".to_string()];
    let id = session
        .state()
        .notes_service
        .save_note("Trip", "photos", false, 20, 16, &uris)
        .await
        .unwrap()
        .unwrap();
    session.flush().await.unwrap();

    // closed before the stored attachment list reached the dialog
    session.dispatch(Event::EditNote(id));
    session.dispatch(Event::ContentChanged("photos from day one".to_string()));
    session.dispatch(Event::DismissDialog);
    session.flush().await.unwrap();

    let repo = session.state().notes_service.repository();
    assert_eq!(repo.get_note(id).await.unwrap().content, "photos from day one");
    let stored: Vec<String> = repo
        .list_attachments_for(id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.file_uri)
        .collect();
    assert_eq!(stored, uris);
}

#[tokio::test]
async fn test_delete_after_quick_edit_stays_deleted() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    for round in 0..50 {
        write_note(&mut session, "Doomed", "draft", false).await;
        let note = find_note(&session, "Doomed");

        session.dispatch(Event::EditNote(note.id));
        session.dispatch(Event::ContentChanged(format!("edit {round}")));
        session.dispatch(Event::Save);
        session.dispatch(Event::EditNote(note.id));
        session.dispatch(Event::DeleteNote);
        session.flush().await.unwrap();

        assert!(session
            .state()
            .notes_service
            .repository()
            .get_note(note.id)
            .await
            .is_err());
        assert!(session.presenter().visible_notes().is_empty());
    }
}

#[tokio::test]
async fn test_blank_note_is_not_saved() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    write_note(&mut session, "   ", "\n\t", true).await;

    session.dispatch(Event::NewNote);
    session.dispatch(Event::Back);
    session.flush().await.unwrap();

    assert!(session.presenter().visible_notes().is_empty());
    assert!(session
        .state()
        .notes_service
        .repository()
        .list_notes()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_cascades_to_attachments() {
    let data_dir = TempDir::new().unwrap();
    let pictures = TempDir::new().unwrap();
    let image = create_source_image(&pictures, "photo.png", b"photo").await;

    let (mut session, _platform) = start_session(open_state(&data_dir).await).await;

    session.dispatch(Event::NewNote);
    session.dispatch(Event::ContentChanged("with picture".to_string()));
    session.dispatch(Event::PickImages(vec![image]));
    session.flush().await.unwrap();
    session.dispatch(Event::Save);
    session.flush().await.unwrap();

    let note = session.presenter().visible_notes()[0].clone();
    session.dispatch(Event::EditNote(note.id));
    session.flush().await.unwrap();
    session.dispatch(Event::DeleteNote);
    session.flush().await.unwrap();

    assert!(session.presenter().visible_notes().is_empty());
    assert!(session.presenter().attachment_counts().is_empty());
    assert!(session
        .state()
        .notes_service
        .repository()
        .list_attachments()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_copy_uses_share_payload() {
    let data_dir = TempDir::new().unwrap();
    let (mut session, platform) = start_session(open_state(&data_dir).await).await;

    session.dispatch(Event::NewNote);
    session.dispatch(Event::TitleChanged("Title".to_string()));
    session.dispatch(Event::ContentChanged("Body".to_string()));
    session.dispatch(Event::CopyDraft);

    assert_eq!(
        platform.clipboard.lock().unwrap().as_deref(),
        Some("Title\n\nBody")
    );
    assert_eq!(*platform.toasts.lock().unwrap(), vec!["Copied".to_string()]);
}

#[tokio::test]
async fn test_biometric_lock_applies_on_next_launch() {
    let data_dir = TempDir::new().unwrap();

    {
        let (mut session, _platform) = start_session(open_state(&data_dir).await).await;
        write_note(&mut session, "Secret", "hidden", false).await;

        session.dispatch(Event::OpenSettings);
        session.dispatch(Event::SetBiometricLock(true));
        session.flush().await.unwrap();

        // the running session is not locked by the change
        assert!(!session.presenter().is_locked());
        assert_eq!(session.presenter().screen(), Screen::Settings);
        session
            .state()
            .notes_service
            .repository()
            .pool()
            .close()
            .await;
    }

    let state = open_state(&data_dir).await;
    assert!(state.settings_service.biometric_lock());

    let platform = Arc::new(FakePlatform::default());
    let mut session = Session::start(state, platform.clone());
    session.flush().await.unwrap();

    assert!(session.presenter().is_locked());
    assert!(session.presenter().visible_notes().is_empty());

    session.dispatch(Event::NewNote);
    assert!(!session.presenter().is_dialog_open());

    platform.allow.store(true, Ordering::SeqCst);
    session.dispatch(Event::RetryUnlock);
    session.flush().await.unwrap();

    assert!(!session.presenter().is_locked());
    assert_eq!(session.presenter().visible_notes().len(), 1);
}

#[tokio::test]
async fn test_schema_mismatch_discards_data() {
    let data_dir = TempDir::new().unwrap();

    {
        let (mut session, _platform) = start_session(open_state(&data_dir).await).await;
        write_note(&mut session, "Old", "data", false).await;

        let pool = session.state().notes_service.repository().pool().clone();
        sqlx::query("PRAGMA user_version = 9")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let (session, _platform) = start_session(open_state(&data_dir).await).await;
    assert!(session.presenter().visible_notes().is_empty());
}

#[tokio::test]
async fn test_notes_survive_restart() {
    let data_dir = TempDir::new().unwrap();

    {
        let (mut session, _platform) = start_session(open_state(&data_dir).await).await;
        write_note(&mut session, "Keep", "me", false).await;
        session
            .state()
            .notes_service
            .repository()
            .pool()
            .close()
            .await;
    }

    let (session, _platform) = start_session(open_state(&data_dir).await).await;
    let visible = session.presenter().visible_notes();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Keep");
}
