//! Browser-rendered document source
//!
//! Loads the page in headless Chromium and returns the rendered DOM instead
//! of the raw response body. Headers come from the `Network.responseReceived`
//! event of the main document; the effective URL is wherever the page ended
//! up after navigation.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use futures::{FutureExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use super::{DocumentSource, FetchError, FetchedPage};
use crate::config::ScrapeConfig;

/// Headless Chromium instance plus its CDP handler task.
///
/// One page is opened per fetch and closed afterwards. The handler task is
/// aborted on drop; call [`BrowserSource::close`] for an orderly shutdown.
pub struct BrowserSource {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

fn browser_err(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

impl BrowserSource {
    /// Launch Chromium with the user agent and TLS policy from `config`.
    ///
    /// # Errors
    ///
    /// [`FetchError::Browser`] when no Chromium executable is found or it
    /// fails to start.
    pub async fn launch(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let timeout = config.request_timeout();

        let mut builder = BrowserConfig::builder()
            .request_timeout(timeout)
            .arg(format!("--user-agent={}", config.user_agent()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");
        if config.accept_invalid_certs() {
            builder = builder.arg("--ignore-certificate-errors");
        }
        let browser_config = builder.build().map_err(FetchError::Browser)?;

        info!("Launching headless browser for document capture");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(browser_err)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e:?}");
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            timeout,
        })
    }

    /// Close the browser and stop the handler task.
    ///
    /// # Errors
    ///
    /// [`FetchError::Browser`] if Chromium rejects the close command.
    pub async fn close(mut self) -> Result<(), FetchError> {
        self.browser.close().await.map_err(browser_err)?;
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {e}");
        }
        self.handler.abort();
        Ok(())
    }

    async fn capture(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_err)?;

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_err)?;

        page.goto(url.as_str()).await.map_err(browser_err)?;
        page.wait_for_navigation().await.map_err(browser_err)?;

        let body = page.content().await.map_err(browser_err)?;
        let landed = page
            .url()
            .await
            .map_err(browser_err)?
            .unwrap_or_else(|| url.to_string());
        let effective_url = Url::parse(&landed)
            .map_err(|source| FetchError::InvalidEffectiveUrl { url: landed, source })?;

        // Events already delivered; the last main-document response wins
        let mut headers = HeaderMap::new();
        while let Some(Some(event)) = responses.next().now_or_never() {
            if event.r#type == ResourceType::Document {
                headers = header_map_from_json(event.response.headers.inner());
            }
        }

        if let Err(e) = page.close().await {
            debug!(%url, "Failed to close page: {e}");
        }

        Ok(FetchedPage {
            effective_url,
            headers,
            body,
        })
    }
}

impl DocumentSource for BrowserSource {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        match tokio::time::timeout(self.timeout, self.capture(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

impl Drop for BrowserSource {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Convert CDP headers (`{"name": "v1\nv2"}`) into a multi-valued map.
///
/// Chromium joins repeated headers with newlines. Names or values that are
/// not valid HTTP tokens are skipped.
pub(crate) fn header_map_from_json(headers: &serde_json::Value) -> HeaderMap {
    let mut map = HeaderMap::new();
    let Some(object) = headers.as_object() else {
        return map;
    };

    for (name, value) in object {
        let Some(value) = value.as_str() else {
            continue;
        };
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        for part in value.split('\n') {
            if let Ok(value) = HeaderValue::from_str(part.trim()) {
                map.append(name.clone(), value);
            }
        }
    }

    map
}
