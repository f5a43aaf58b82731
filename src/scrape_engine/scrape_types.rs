//! Error type for scrape operations.

use crate::fetcher::FetchError;

/// Fatal failure of a `scrape` call
///
/// Everything that can be skipped (an unresolvable image, an undecodable
/// `data:` URI, an unfollowable refresh target) is reported as a
/// [`Diagnostic`](crate::page_extractor::Diagnostic) instead.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The requested URL does not parse
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The requested URL is not http(s)
    #[error("unsupported scheme '{scheme}' in '{url}', only http and https can be scraped")]
    UnsupportedScheme { url: String, scheme: String },

    /// A `<link rel="canonical">` href does not parse
    #[error("invalid canonical link '{href}': {source}")]
    InvalidCanonical {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("scrape operation was cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;
