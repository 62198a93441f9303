//! Storage module
//!
//! Provides the app-private directory that picked images are copied into.

pub mod image_store;

pub use image_store::ImageStore;
