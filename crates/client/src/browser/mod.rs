//! Chromium wiring for the cache proxy.
//!
//! This module attaches a `CacheProxy` to a live page through the Chrome
//! DevTools Protocol: the Fetch domain pauses every request for the
//! controller to resolve, and the Network domain reports responses for it
//! to capture. All events for a page are drained by one task, so the
//! controller's handlers never overlap.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused, FailRequestParams,
    FulfillRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, ErrorReason, EventResponseReceived, GetResponseBodyParams, Headers,
};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::intercept::{CacheProxy, InterceptError, PageRequest, PageResponse};
use webstash_core::{AppConfig, Error};

/// Launch a browser per the loaded configuration.
///
/// Returns the browser handle plus the spawned CDP event-drain task; the
/// task must stay alive for the browser connection to make progress.
pub async fn launch(config: &AppConfig) -> Result<(Browser, JoinHandle<()>), Error> {
    let mut builder = BrowserConfig::builder();
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder.build().map_err(Error::Browser)?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| Error::Browser(e.to_string()))?;

    let drain = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("browser handler event error: {e}");
                break;
            }
        }
    });

    Ok((browser, drain))
}

/// Enable interception on `page` and drive `proxy` from its event streams.
///
/// Paused requests and observed responses are handled sequentially in a
/// single task. Errors are scoped to the request or response that raised
/// them: they are logged and the loop moves on.
pub async fn attach(page: &Page, mut proxy: CacheProxy) -> Result<JoinHandle<()>, Error> {
    // Listeners are registered before the domains are enabled so no event
    // emitted during setup is missed.
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| Error::Browser(format!("request listener failed: {e}")))?;
    let mut received = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| Error::Browser(format!("response listener failed: {e}")))?;

    page.execute(FetchEnableParams::default())
        .await
        .map_err(|e| Error::Browser(format!("Fetch.enable failed: {e}")))?;
    page.execute(NetworkEnableParams::default())
        .await
        .map_err(|e| Error::Browser(format!("Network.enable failed: {e}")))?;

    let page = page.clone();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = paused.next() => {
                    let Some(event) = event else { break };
                    let request = PausedRequest { page: page.clone(), event };
                    if let Err(e) = proxy.handle_request(&request).await {
                        tracing::warn!(url = request.url(), error = %e, "request handling failed");
                    }
                }
                event = received.next() => {
                    let Some(event) = event else { break };
                    let response = ReceivedResponse { page: page.clone(), event };
                    if let Err(e) = proxy.handle_response(&response).await {
                        tracing::warn!(url = response.url(), error = %e, "response capture failed");
                    }
                }
            }
        }
    });

    Ok(task)
}

/// Open one page, attach a fresh proxy, navigate, let the page settle,
/// then close it.
pub async fn visit(browser: &Browser, config: &AppConfig, url: &str) -> Result<(), Error> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| Error::Browser(format!("failed to open page: {e}")))?;
    let intercept = attach(&page, CacheProxy::new(config)).await?;

    let navigation = tokio::time::timeout(config.timeout(), async {
        page.goto(url).await?.wait_for_navigation().await?;
        Ok::<_, chromiumoxide::error::CdpError>(())
    })
    .await;

    let result = match navigation {
        Ok(Ok(())) => {
            tokio::time::sleep(config.settle()).await;
            Ok(())
        }
        Ok(Err(e)) => Err(Error::Browser(format!("navigation failed: {e}"))),
        Err(_) => Err(Error::Browser(format!("navigation timeout after {}ms", config.timeout_ms))),
    };

    page.close().await.ok();
    intercept.abort();
    result
}

/// Paused-request adapter over `Fetch.requestPaused`.
struct PausedRequest {
    page: Page,
    event: Arc<EventRequestPaused>,
}

impl PausedRequest {
    /// Marker key shared with the matching `Network.responseReceived`
    /// event. Falls back to the Fetch id for requests the Network domain
    /// never saw.
    fn key(&self) -> &str {
        self.event
            .network_id
            .as_ref()
            .map(|id| id.inner().as_str())
            .unwrap_or_else(|| self.event.request_id.inner().as_str())
    }
}

#[async_trait::async_trait]
impl PageRequest for PausedRequest {
    fn id(&self) -> &str {
        self.key()
    }

    fn url(&self) -> &str {
        &self.event.request.url
    }

    fn method(&self) -> &str {
        &self.event.request.method
    }

    async fn fulfill(&self, status: u16, body: Vec<u8>) -> Result<(), InterceptError> {
        let params = FulfillRequestParams::builder()
            .request_id(self.event.request_id.clone())
            .response_code(i64::from(status))
            .body(BASE64.encode(&body))
            .build()
            .map_err(InterceptError::Fulfill)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| InterceptError::Fulfill(e.to_string()))?;
        Ok(())
    }

    async fn pass_through(&self) -> Result<(), InterceptError> {
        let params = ContinueRequestParams::builder()
            .request_id(self.event.request_id.clone())
            .build()
            .map_err(InterceptError::PassThrough)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| InterceptError::PassThrough(e.to_string()))?;
        Ok(())
    }

    async fn abort(&self) -> Result<(), InterceptError> {
        let params = FailRequestParams::builder()
            .request_id(self.event.request_id.clone())
            .error_reason(ErrorReason::Failed)
            .build()
            .map_err(InterceptError::Abort)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| InterceptError::Abort(e.to_string()))?;
        Ok(())
    }
}

/// Observed-response adapter over `Network.responseReceived`.
struct ReceivedResponse {
    page: Page,
    event: Arc<EventResponseReceived>,
}

#[async_trait::async_trait]
impl PageResponse for ReceivedResponse {
    fn request_id(&self) -> &str {
        self.event.request_id.inner().as_str()
    }

    fn url(&self) -> &str {
        &self.event.response.url
    }

    fn status(&self) -> u16 {
        self.event.response.status as u16
    }

    fn content_length(&self) -> Option<u64> {
        header_u64(&self.event.response.headers, "content-length")
    }

    async fn body(&self) -> Result<Bytes, InterceptError> {
        let params = GetResponseBodyParams::builder()
            .request_id(self.event.request_id.clone())
            .build()
            .map_err(InterceptError::Body)?;
        let returns = self
            .page
            .execute(params)
            .await
            .map_err(|e| InterceptError::Body(e.to_string()))?;

        let body = if returns.result.base64_encoded {
            BASE64
                .decode(returns.result.body.as_bytes())
                .map_err(|e| InterceptError::Body(e.to_string()))?
        } else {
            returns.result.body.into_bytes()
        };
        Ok(Bytes::from(body))
    }
}

/// Case-insensitive numeric header lookup. CDP reports header names with
/// whatever casing the server sent.
fn header_u64(headers: &Headers, name: &str) -> Option<u64> {
    headers.inner().as_object()?.iter().find_map(|(key, value)| {
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        value.as_str().and_then(|v| v.trim().parse().ok()).or_else(|| value.as_u64())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = Headers::new(json!({"Content-Length": "128"}));
        assert_eq!(header_u64(&headers, "content-length"), Some(128));
    }

    #[test]
    fn test_header_lookup_missing_and_malformed() {
        let headers = Headers::new(json!({"content-type": "text/html"}));
        assert_eq!(header_u64(&headers, "content-length"), None);

        let malformed = Headers::new(json!({"content-length": "abc"}));
        assert_eq!(header_u64(&malformed, "content-length"), None);
    }

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_launch_headless() {
        let config = AppConfig::default();
        let result = launch(&config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_visit_captures_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { files_dir: dir.path().to_path_buf(), ..Default::default() };

        let (browser, _drain) = launch(&config).await.unwrap();
        visit(&browser, &config, "https://example.com/").await.unwrap();

        assert!(dir.path().join("example.com/index.html").is_file());
    }
}
