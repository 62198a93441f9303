//! Application configuration constants
//!
//! Central location for the font-size bounds, storage names and the
//! user-facing strings shared by the presentation layer and the platform
//! collaborators.

use std::path::{Path, PathBuf};

// ===== Font Sizes =====

/// Smallest title font size a note can be stepped down to
pub const MIN_TITLE_SIZE: i64 = 12;
/// Largest title font size a note can be stepped up to
pub const MAX_TITLE_SIZE: i64 = 40;
/// Title font size of a fresh draft
pub const DEFAULT_TITLE_SIZE: i64 = 20;

/// Smallest content font size a note can be stepped down to
pub const MIN_CONTENT_SIZE: i64 = 10;
/// Largest content font size a note can be stepped up to
pub const MAX_CONTENT_SIZE: i64 = 35;
/// Content font size of a fresh draft
pub const DEFAULT_CONTENT_SIZE: i64 = 16;

// ===== Storage =====

/// Schema version of the notes database.
/// Any other version found on disk is discarded and the tables recreated.
pub const SCHEMA_VERSION: i64 = 10;

/// File name of the notes database inside the data directory
pub const DATABASE_FILE: &str = "notes-db.sqlite";

/// Directory (inside the data directory) holding imported images
pub const ATTACHMENTS_DIR: &str = "files";

/// File name of the persisted settings inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Prefix of imported image file names (`img_<millis>.jpg`)
pub const IMAGE_FILE_PREFIX: &str = "img_";

/// Extension given to imported images
pub const IMAGE_FILE_EXTENSION: &str = "jpg";

// ===== Platform Strings =====

pub const SHARE_CHOOSER_TITLE: &str = "Share via";
pub const SHARE_MIME_TYPE: &str = "text/plain";
pub const CLIPBOARD_LABEL: &str = "FNote";
pub const TOAST_COPIED: &str = "Copied";
pub const TOAST_FILE_NOT_FOUND: &str = "File not found";
pub const IMAGE_MIME_TYPE: &str = "image/*";

pub const BIOMETRIC_PROMPT_TITLE: &str = "Security Check";
pub const BIOMETRIC_PROMPT_SUBTITLE: &str = "Authenticate to access your notes";
pub const BIOMETRIC_PROMPT_NEGATIVE: &str = "Cancel";

// ===== Logging =====

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "fnotes=info,warn";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "FNOTES_DATA_DIR";

/// Resolved filesystem locations for one application instance
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory from the environment, falling back to the
    /// platform data directory and finally the working directory.
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("fnotes")))
            .unwrap_or_else(|| PathBuf::from("fnotes-data"));

        Self { data_dir }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.data_dir.join(ATTACHMENTS_DIR)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
