//! Services module
//!
//! Business logic services that coordinate between the presentation layer,
//! the repository and the platform collaborators.

pub mod attachments;
pub mod notes;
pub mod settings;
pub mod sharing;

pub use attachments::AttachmentsService;
pub use notes::NotesService;
pub use settings::{AppSettings, SettingsService, ThemeMode};
