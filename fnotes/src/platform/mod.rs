//! Platform collaborators
//!
//! The OS conveniences the notes core relies on but does not implement:
//! the biometric prompt, the share chooser, the clipboard, transient
//! notifications and the external image viewer. The binary ships a console
//! implementation; tests substitute their own.

pub mod console;

pub use console::ConsolePlatform;

use crate::config::{
    BIOMETRIC_PROMPT_NEGATIVE, BIOMETRIC_PROMPT_SUBTITLE, BIOMETRIC_PROMPT_TITLE, IMAGE_MIME_TYPE,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Text shown by the biometric prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricPrompt {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub negative_button: &'static str,
}

impl Default for BiometricPrompt {
    fn default() -> Self {
        Self {
            title: BIOMETRIC_PROMPT_TITLE,
            subtitle: BIOMETRIC_PROMPT_SUBTITLE,
            negative_button: BIOMETRIC_PROMPT_NEGATIVE,
        }
    }
}

/// A file handed to another application with temporary read access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHandle {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub grant_read: bool,
}

impl ContentHandle {
    pub fn image(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            mime_type: IMAGE_MIME_TYPE,
            grant_read: true,
        }
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Run the biometric prompt. `false` on failure or cancellation.
    async fn authenticate(&self, prompt: &BiometricPrompt) -> bool;

    /// Hand a plain-text payload to the system share chooser
    fn share_text(&self, chooser_title: &str, mime_type: &str, text: &str) -> Result<()>;

    fn set_clipboard(&self, label: &str, text: &str) -> Result<()>;

    /// Short-lived user-facing message
    fn show_toast(&self, message: &str);

    /// Ask the system to open the content with a viewer
    fn view(&self, handle: &ContentHandle) -> Result<()>;
}
