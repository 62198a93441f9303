//! Attachments service
//!
//! Imports picked images into app-private storage and opens stored
//! attachments with the system image viewer.

use crate::config::TOAST_FILE_NOT_FOUND;
use crate::database::Attachment;
use crate::platform::{ContentHandle, Platform};
use crate::storage::ImageStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Service for managing attachment files
#[derive(Clone)]
pub struct AttachmentsService {
    images: ImageStore,
}

impl AttachmentsService {
    pub fn new(images: ImageStore) -> Self {
        Self { images }
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.images
    }

    /// Copy picked images into app-private storage.
    /// Items that fail to copy are dropped from the result.
    pub async fn import_images(&self, sources: &[PathBuf]) -> Vec<String> {
        tracing::info!("Importing {} images", sources.len());
        let copied = self.images.import_all(sources).await;
        if copied.len() < sources.len() {
            tracing::warn!(
                "{} of {} images could not be copied",
                sources.len() - copied.len(),
                sources.len()
            );
        }
        copied
    }

    /// Open a stored attachment with the system image viewer.
    /// Failures are reported to the user as toasts.
    pub fn open_attachment(&self, platform: &dyn Platform, file_uri: &str) {
        let path = Path::new(file_uri);

        if !path.exists() {
            tracing::warn!("Attachment missing on disk: {}", file_uri);
            platform.show_toast(TOAST_FILE_NOT_FOUND);
            return;
        }

        let handle = ContentHandle::image(path);
        if let Err(e) = platform.view(&handle) {
            tracing::warn!("Cannot open attachment {}: {}", file_uri, e);
            platform.show_toast(&format!("Cannot open: {}", e));
        }
    }
}

/// Number of attachment rows owned by each note
pub fn attachment_counts(attachments: &[Attachment]) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for attachment in attachments {
        *counts.entry(attachment.note_id).or_insert(0) += 1;
    }
    counts
}
