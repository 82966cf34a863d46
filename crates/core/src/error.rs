//! Unified error types for webstash.

use std::path::PathBuf;

/// Unified error type shared by the webstash crates.
///
/// Errors are scoped to a single request or response: the driver logs them
/// and moves on, so one failed capture never disturbs other in-flight
/// traffic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Reading a stored response from disk failed.
    #[error("failed to read stored response at {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    /// Writing a captured response to disk failed.
    #[error("failed to write captured response at {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },

    /// The terminal action on an intercepted request failed.
    #[error("request action failed: {0}")]
    RequestAction(String),

    /// Retrieving a response body from the browser failed.
    #[error("response body unavailable: {0}")]
    Body(String),

    /// Browser launch, page setup, or navigation failed.
    #[error("browser error: {0}")]
    Browser(String),
}
