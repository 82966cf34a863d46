//! Client code for webstash.
//!
//! This crate provides the interception controller that decides, per network
//! request, between replaying a stored response and capturing a fresh one,
//! plus the chromiumoxide adapter that wires it to a live page.

#[cfg(feature = "browser")]
pub mod browser;
pub mod intercept;

pub use intercept::{CacheProxy, CaptureOutcome, InterceptError, PageRequest, PageResponse, RequestDecision};
