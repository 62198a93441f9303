//! Console platform
//!
//! Terminal stand-ins for the OS collaborators. Output goes to stdout; the
//! biometric prompt is answered by the shell through an answer channel.

use super::{BiometricPrompt, ContentHandle, Platform};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Environment variable naming an external image viewer command
pub const VIEWER_ENV: &str = "FNOTES_VIEWER";

pub struct ConsolePlatform {
    answers: tokio::sync::Mutex<mpsc::Receiver<bool>>,
    clipboard: Mutex<Option<String>>,
    viewer: Option<String>,
    prompting: AtomicBool,
}

impl ConsolePlatform {
    /// Returns the platform and the sender the shell uses to answer
    /// biometric prompts
    pub fn new() -> (Self, mpsc::Sender<bool>) {
        let (tx, rx) = mpsc::channel(1);
        let platform = Self {
            answers: tokio::sync::Mutex::new(rx),
            clipboard: Mutex::new(None),
            viewer: std::env::var(VIEWER_ENV).ok().filter(|v| !v.trim().is_empty()),
            prompting: AtomicBool::new(false),
        };
        (platform, tx)
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.lock().ok().and_then(|clip| clip.clone())
    }

    /// Whether a biometric prompt is waiting for an answer
    pub fn is_prompting(&self) -> bool {
        self.prompting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn authenticate(&self, prompt: &BiometricPrompt) -> bool {
        let mut answers = self.answers.lock().await;

        println!(
            "[{}] {} (type `auth` to confirm or `{}`)",
            prompt.title,
            prompt.subtitle,
            prompt.negative_button.to_lowercase()
        );

        self.prompting.store(true, Ordering::SeqCst);
        let answer = answers.recv().await.unwrap_or(false);
        self.prompting.store(false, Ordering::SeqCst);
        answer
    }

    fn share_text(&self, chooser_title: &str, mime_type: &str, text: &str) -> Result<()> {
        println!("[{} ({})]\n{}", chooser_title, mime_type, text);
        Ok(())
    }

    fn set_clipboard(&self, label: &str, text: &str) -> Result<()> {
        let mut clipboard = self
            .clipboard
            .lock()
            .map_err(|e| AppError::Platform(format!("Clipboard unavailable: {}", e)))?;
        *clipboard = Some(text.to_string());
        tracing::debug!("Clipboard set ({}), {} bytes", label, text.len());
        Ok(())
    }

    fn show_toast(&self, message: &str) {
        println!("» {}", message);
    }

    fn view(&self, handle: &ContentHandle) -> Result<()> {
        match &self.viewer {
            Some(viewer) => {
                Command::new(viewer)
                    .arg(&handle.path)
                    .spawn()
                    .map_err(|e| AppError::Platform(format!("{}: {}", viewer, e)))?;
                Ok(())
            }
            None => {
                println!("[view {}] {}", handle.mime_type, handle.path.display());
                Ok(())
            }
        }
    }
}
