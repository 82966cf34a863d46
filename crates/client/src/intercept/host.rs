//! Host-runtime seams for intercepted traffic.
//!
//! The controller never talks to a concrete browser API. It sees requests
//! and responses through these traits; the browser adapter implements them
//! over CDP events, and tests implement them with in-memory fakes.

use bytes::Bytes;

/// Errors surfaced by the host runtime while acting on intercepted traffic.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// Fulfilling a request with a synthetic response failed.
    #[error("fulfill failed: {0}")]
    Fulfill(String),

    /// Releasing a request to the network failed.
    #[error("continue failed: {0}")]
    PassThrough(String),

    /// Aborting a request failed.
    #[error("abort failed: {0}")]
    Abort(String),

    /// The response body could not be retrieved.
    #[error("body retrieval failed: {0}")]
    Body(String),
}

/// An intercepted network request, paused until exactly one terminal action
/// (fulfill, pass through, or abort) is taken.
#[async_trait::async_trait]
pub trait PageRequest: Send + Sync {
    /// Stable per-request identifier, shared with the matching response
    /// event.
    fn id(&self) -> &str;

    /// Full request URL.
    fn url(&self) -> &str;

    /// HTTP method.
    fn method(&self) -> &str;

    /// Answer the request with a synthetic response.
    async fn fulfill(&self, status: u16, body: Vec<u8>) -> Result<(), InterceptError>;

    /// Release the request to the network unmodified.
    async fn pass_through(&self) -> Result<(), InterceptError>;

    /// Abort the request without touching the network.
    async fn abort(&self) -> Result<(), InterceptError>;
}

/// A response observed for a request that was not aborted, whether it came
/// from the network or from the proxy's own synthetic fulfillment.
#[async_trait::async_trait]
pub trait PageResponse: Send + Sync {
    /// Identifier of the originating request.
    fn request_id(&self) -> &str;

    /// URL of the originating request.
    fn url(&self) -> &str;

    /// HTTP status code.
    fn status(&self) -> u16;

    /// Content-Length header value, if present.
    fn content_length(&self) -> Option<u64>;

    /// Retrieve the full response body.
    ///
    /// Fails outright for bodiless responses; callers must check
    /// `content_length` first.
    async fn body(&self) -> Result<Bytes, InterceptError>;
}
