//! Core types and shared functionality for webstash.
//!
//! This crate provides:
//! - URL-to-path mapping and the on-disk response store
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, CaptureMode};
pub use error::Error;
pub use store::{FileStore, INDEX_FILE, storage_path};
