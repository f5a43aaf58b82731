//! Document sources
//!
//! A [`DocumentSource`] performs one retrieval and hands back the landed URL,
//! the response headers and the body as text. The scraper is generic over
//! the source and applies identical extraction to every implementation.
//!
//! - [`HttpSource`]: plain HTTP(S) GET through `reqwest`
//! - `BrowserSource` (feature `browser`): rendered DOM from headless Chromium

pub mod http;

#[cfg(feature = "browser")]
pub mod browser;

use std::future::Future;

use reqwest::header::HeaderMap;
use url::Url;

#[cfg(feature = "browser")]
pub use browser::BrowserSource;
pub use http::HttpSource;

/// Result of one retrieval
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the source finally landed on, after transport-level redirects
    pub effective_url: Url,
    /// Response headers; repeated names keep every value
    pub headers: HeaderMap,
    /// Body transcoded to UTF-8
    pub body: String,
}

/// Transport-level failure. Always fatal for the scrape in progress.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("browser capture failed: {0}")]
    Browser(String),

    #[error("source reported an invalid effective URL '{url}': {source}")]
    InvalidEffectiveUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no document available at {url}: {reason}")]
    Unavailable { url: String, reason: String },
}

/// Capability to retrieve one document
///
/// Implementations follow transport redirects themselves and report where
/// they landed in [`FetchedPage::effective_url`]. They must bound the call
/// with their own timeout.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

impl<S: DocumentSource> DocumentSource for &S {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        (**self).fetch(url)
    }
}
