//! Request/response interception decisions.
//!
//! `CacheProxy` is the seat of all policy. Per paused request it consults
//! the on-disk store and fulfills, passes through, or aborts; per observed
//! response it decides whether the body is captured for future replay. A
//! small marker set keeps responses the proxy itself fulfilled from being
//! re-captured as if they had come from the network.

mod host;

pub use host::{InterceptError, PageRequest, PageResponse};

use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;
use webstash_core::{AppConfig, CaptureMode, Error, FileStore};

/// Terminal action taken for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDecision {
    /// Served from the store with a synthetic 200.
    Fulfilled(PathBuf),

    /// Released to the network for capture.
    PassedThrough,

    /// Aborted: offline-mode cache miss.
    Rejected,
}

/// What `handle_response` did with an observed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The response was the proxy's own synthetic reply; the store is
    /// untouched.
    Replayed,

    /// Response body written to the store.
    Stored(PathBuf),

    /// Not eligible for capture (non-2xx status).
    Skipped { status: u16 },
}

/// Per-page interception controller.
///
/// Owns the served-from-cache marker set. One instance per page session,
/// driven from a single task so the handlers never overlap and the set
/// needs no lock.
pub struct CacheProxy {
    mode: CaptureMode,
    store: FileStore,
    served_from_cache: HashSet<String>,
}

impl CacheProxy {
    /// Build a controller from loaded configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_mode(config.mode, config.files_dir.clone())
    }

    /// Build a controller with an explicit mode and cache root.
    pub fn with_mode(mode: CaptureMode, files_dir: impl Into<PathBuf>) -> Self {
        Self { mode, store: FileStore::new(files_dir), served_from_cache: HashSet::new() }
    }

    /// The mode this controller was constructed with.
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Decide and execute the terminal action for a paused request.
    ///
    /// Exactly one of fulfill, pass through, or abort is invoked. A stored
    /// entry is replayed with status 200 and the file's bytes; a miss falls
    /// through to the network in proxy mode and is aborted in offline mode.
    pub async fn handle_request<R>(&mut self, request: &R) -> Result<RequestDecision, Error>
    where
        R: PageRequest + ?Sized,
    {
        let url = parse_url(request.url())?;
        let path = self.store.path_for(&url);

        if self.store.contains(&path) {
            let body = self.store.read(&path)?;
            tracing::debug!(url = request.url(), path = %path.display(), "replaying stored response");
            request
                .fulfill(200, body)
                .await
                .map_err(|e| Error::RequestAction(e.to_string()))?;
            self.served_from_cache.insert(request.id().to_string());
            return Ok(RequestDecision::Fulfilled(path));
        }

        match self.mode {
            CaptureMode::Proxy => {
                tracing::debug!(url = request.url(), method = request.method(), "cache miss, passing through");
                request
                    .pass_through()
                    .await
                    .map_err(|e| Error::RequestAction(e.to_string()))?;
                Ok(RequestDecision::PassedThrough)
            }
            CaptureMode::Offline => {
                tracing::debug!(url = request.url(), "cache miss in offline mode, aborting");
                request.abort().await.map_err(|e| Error::RequestAction(e.to_string()))?;
                Ok(RequestDecision::Rejected)
            }
        }
    }

    /// Decide whether an observed response is captured into the store.
    ///
    /// Responses the proxy fulfilled itself consume their marker and leave
    /// the store untouched. Genuine network responses are captured when
    /// their status is 2xx.
    pub async fn handle_response<R>(&mut self, response: &R) -> Result<CaptureOutcome, Error>
    where
        R: PageResponse + ?Sized,
    {
        let url = parse_url(response.url())?;
        let path = self.store.path_for(&url);

        // A marker means this is the synthetic reply from handle_request;
        // consumed exactly once, never re-captured.
        if self.served_from_cache.remove(response.request_id()) {
            return Ok(CaptureOutcome::Replayed);
        }

        let status = response.status();
        if !(200..300).contains(&status) {
            return Ok(CaptureOutcome::Skipped { status });
        }

        // The host body API fails outright for bodiless responses, so an
        // empty capture is written without asking for the body.
        if response.content_length() == Some(0) {
            self.store.write(&path, &[])?;
            return Ok(CaptureOutcome::Stored(path));
        }

        let body = match response.body().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = response.url(), error = %e, "response body unavailable, not captured");
                return Err(Error::Body(e.to_string()));
            }
        };

        self.store.write(&path, &body)?;
        tracing::debug!(url = response.url(), path = %path.display(), bytes = body.len(), "captured response");
        Ok(CaptureOutcome::Stored(path))
    }
}

fn parse_url(raw: &str) -> Result<Url, Error> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl { url: raw.to_string(), reason: e.to_string() })
}
