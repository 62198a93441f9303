//! Share and clipboard actions
//!
//! Both actions send the same plain-text form of the note being edited.

use crate::config::{CLIPBOARD_LABEL, SHARE_CHOOSER_TITLE, SHARE_MIME_TYPE, TOAST_COPIED};
use crate::error::Result;
use crate::platform::Platform;

/// Plain-text form of a note: `title\n\ncontent`, or the content alone when
/// the title is blank
pub fn share_payload(title: &str, content: &str) -> String {
    if title.trim().is_empty() {
        content.to_string()
    } else {
        format!("{}\n\n{}", title, content)
    }
}

/// Hand the note to the system share chooser
pub fn share_note(platform: &dyn Platform, title: &str, content: &str) -> Result<()> {
    let payload = share_payload(title, content);
    tracing::debug!("Sharing note text ({} bytes)", payload.len());
    platform.share_text(SHARE_CHOOSER_TITLE, SHARE_MIME_TYPE, &payload)
}

/// Put the note on the clipboard and confirm with a toast
pub fn copy_note(platform: &dyn Platform, title: &str, content: &str) -> Result<()> {
    let payload = share_payload(title, content);
    platform.set_clipboard(CLIPBOARD_LABEL, &payload)?;
    platform.show_toast(TOAST_COPIED);
    Ok(())
}
