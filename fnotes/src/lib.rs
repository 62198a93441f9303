//! FNotes library
//!
//! Offline notes core: the SQLite store and its live queries, the notes
//! and settings services, image import, and the presentation state machine
//! driven by a session. The binary wraps it in a console shell.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod platform;
pub mod presentation;
pub mod services;
pub mod shell;
pub mod storage;
