pub mod config;
pub mod escaped_fragment;
pub mod fetcher;
pub mod page_extractor;
pub mod resolver;
pub mod scrape_engine;
pub mod utils;

pub use config::ScrapeConfig;
#[cfg(feature = "browser")]
pub use fetcher::BrowserSource;
pub use fetcher::{DocumentSource, FetchError, FetchedPage, HttpSource};
pub use page_extractor::schema::*;
pub use resolver::{DataUri, UriRef, UrlResolver};
pub use scrape_engine::{ScrapeError, ScrapeResult, Scraper};

/// Scrape `uri` over HTTP with default settings and the given hop budget.
///
/// ```no_run
/// # async fn demo() -> Result<(), kodegen_tools_linkpreview::ScrapeError> {
/// let document = kodegen_tools_linkpreview::scrape("https://example.com", 5).await?;
/// println!("{}: {}", document.preview.title, document.preview.description);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// See [`ScrapeError`].
pub async fn scrape(uri: &str, max_hops: u32) -> ScrapeResult<Document> {
    let config = ScrapeConfig::builder().max_hops(max_hops).build()?;
    scrape_with_config(uri, &config).await
}

/// Scrape `uri` over HTTP with explicit settings.
///
/// # Errors
///
/// See [`ScrapeError`].
pub async fn scrape_with_config(uri: &str, config: &ScrapeConfig) -> ScrapeResult<Document> {
    Scraper::new(config)?.scrape(uri).await
}
