//! Presentation layer
//!
//! In-memory UI state and its transition rules. Rendering is left to the
//! front end; this module decides what it shows and what it asks for.

pub mod draft;
pub mod state;

pub use draft::{AttachmentEdit, Draft, SaveRequest, Step};
pub use state::{Access, Effect, Event, Presenter, Screen, Search};
