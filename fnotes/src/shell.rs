//! Console shell
//!
//! Maps text commands onto presentation events and renders the presenter
//! as plain text.

use crate::presentation::{Event, Presenter, Screen, Step};
use crate::services::ThemeMode;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  new                 open the new note dialog
  edit <id>           open a note for editing
  title <text>        set the draft title
  content <text>      set the draft content
  pin                 toggle pinned
  title+ | title-     step the title font size
  size+ | size-       step the content font size
  attach <paths..>    attach image files
  detach <path>       remove an attachment from the draft
  open <path>         open an attachment in the viewer
  save | cancel | dismiss | delete
  share | copy        share or copy the draft text
  back | up           system back / toolbar up
  search              toggle search
  query <text>        set the search query
  settings            open settings
  theme <0-3|name>    choose the theme mode
  lock on|off         toggle the biometric lock
  unlock              retry authentication
  auth                confirm a pending biometric prompt
  list                show the current screen again
  help | quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: {0} (type `help`)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// One parsed line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(Event),
    /// Confirm a pending biometric prompt
    Confirm,
    /// Cancel the biometric prompt if one is pending, otherwise the dialog
    Cancel,
    List,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let event = match word {
        "new" => Event::NewNote,
        "edit" => {
            let id = rest.parse().map_err(|_| ParseError::Usage("edit <id>"))?;
            Event::EditNote(id)
        }
        "title" => Event::TitleChanged(rest.to_string()),
        "content" => Event::ContentChanged(rest.to_string()),
        "pin" => Event::TogglePin,
        "title+" => Event::StepTitleSize(Step::Up),
        "title-" => Event::StepTitleSize(Step::Down),
        "size+" => Event::StepContentSize(Step::Up),
        "size-" => Event::StepContentSize(Step::Down),
        "attach" => Event::PickImages(rest.split_whitespace().map(PathBuf::from).collect()),
        "detach" if !rest.is_empty() => Event::RemoveAttachment(rest.to_string()),
        "detach" => return Err(ParseError::Usage("detach <path>")),
        "open" if !rest.is_empty() => Event::OpenAttachment(rest.to_string()),
        "open" => return Err(ParseError::Usage("open <path>")),
        "save" => Event::Save,
        "cancel" => return Ok(Command::Cancel),
        "dismiss" => Event::DismissDialog,
        "delete" => Event::DeleteNote,
        "share" => Event::ShareDraft,
        "copy" => Event::CopyDraft,
        "back" => Event::Back,
        "up" => Event::NavigateUp,
        "search" => Event::ToggleSearch,
        "query" => Event::SearchQueryChanged(rest.to_string()),
        "settings" => Event::OpenSettings,
        "theme" => Event::SetThemeMode(parse_theme(rest)?),
        "lock" => match rest {
            "on" => Event::SetBiometricLock(true),
            "off" => Event::SetBiometricLock(false),
            _ => return Err(ParseError::Usage("lock on|off")),
        },
        "unlock" => Event::RetryUnlock,
        "auth" => return Ok(Command::Confirm),
        "list" => return Ok(Command::List),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Command::Event(event))
}

fn parse_theme(value: &str) -> Result<ThemeMode, ParseError> {
    const USAGE: &str = "theme <0-3|auto|light|dark|black>";

    if let Ok(index) = value.parse::<i64>() {
        if (0..=3).contains(&index) {
            return Ok(ThemeMode::from(index));
        }
        return Err(ParseError::Usage(USAGE));
    }

    ThemeMode::ALL
        .into_iter()
        .find(|mode| mode.label().eq_ignore_ascii_case(value))
        .ok_or(ParseError::Usage(USAGE))
}

/// Plain-text rendering of everything the presenter currently shows
pub fn render(presenter: &Presenter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", presenter.header_title());

    if presenter.is_locked() {
        out.push_str("Locked. Type `unlock` to authenticate or `back` to exit.\n");
        return out;
    }

    match presenter.screen() {
        Screen::Listing => render_listing(presenter, &mut out),
        Screen::Settings => render_settings(presenter, &mut out),
    }

    if let (Some(draft), Some(title)) = (presenter.draft(), presenter.dialog_title()) {
        let _ = writeln!(out, "\n-- {} --", title);
        let _ = writeln!(out, "Title ({}pt): {}", draft.title_size, draft.title);
        let _ = writeln!(out, "Content ({}pt): {}", draft.content_size, draft.content);
        let _ = writeln!(out, "Pinned: {}", if draft.pinned { "yes" } else { "no" });
        if !draft.attachment_uris.is_empty() {
            out.push_str("Images:\n");
            for uri in &draft.attachment_uris {
                let _ = writeln!(out, "  {}", uri);
            }
        }
    }

    out
}

fn render_listing(presenter: &Presenter, out: &mut String) {
    let search = presenter.search();
    if search.active {
        let _ = writeln!(out, "Search: {}", search.query);
    }

    let notes = presenter.visible_notes();
    if notes.is_empty() {
        out.push_str("No notes found\n");
        return;
    }

    let counts = presenter.attachment_counts();
    for note in &notes {
        let modified: DateTime<Local> = note.modified_at().into();
        let marker = if note.is_priority { "*" } else { " " };
        let _ = write!(
            out,
            "{} #{} {}  [{}]",
            marker,
            note.id,
            note.title,
            modified.format("%Y-%m-%d %H:%M")
        );
        match counts.get(&note.id) {
            Some(1) => out.push_str(" (1 image)"),
            Some(n) => {
                let _ = write!(out, " ({} images)", n);
            }
            None => {}
        }
        out.push('\n');

        if let Some(first_line) = note.content.lines().next() {
            let _ = writeln!(out, "    {}", first_line);
        }
    }
}

fn render_settings(presenter: &Presenter, out: &mut String) {
    let settings = presenter.settings();

    out.push_str("Theme:");
    for (index, mode) in ThemeMode::ALL.into_iter().enumerate() {
        let selected = if mode == settings.theme_mode { "x" } else { " " };
        let _ = write!(out, " [{}] {} {}", selected, index, mode.label());
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "Biometric lock: {}",
        if settings.biometric_lock { "on" } else { "off" }
    );
}
