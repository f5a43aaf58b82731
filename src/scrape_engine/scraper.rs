//! The fetch → extract → redirect loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::scrape_types::{ScrapeError, ScrapeResult};
use super::state::ResolutionState;
use crate::config::ScrapeConfig;
use crate::fetcher::{DocumentSource, FetchedPage, HttpSource};
use crate::page_extractor::{
    Diagnostic, Document, DocumentPreview, ExtractContext, ExtractOutcome, Extraction,
    RedirectTrigger, extract,
};

/// Link preview scraper over a [`DocumentSource`]
///
/// Each call owns its own [`ResolutionState`]; a `Scraper` can serve
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct Scraper<S> {
    source: S,
    max_hops: u32,
}

impl Scraper<HttpSource> {
    /// HTTP-backed scraper using the transport settings and hop budget in `config`.
    ///
    /// # Errors
    ///
    /// Propagates client construction failures as [`ScrapeError::Fetch`].
    pub fn new(config: &ScrapeConfig) -> ScrapeResult<Self> {
        Ok(Self::with_source(HttpSource::new(config)?, config.max_hops()))
    }
}

impl<S: DocumentSource> Scraper<S> {
    #[must_use]
    pub fn with_source(source: S, max_hops: u32) -> Self {
        Self { source, max_hops }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// Scrape `uri`, following refresh, canonical and escaped-fragment hops
    /// within the hop budget.
    ///
    /// # Errors
    ///
    /// See [`ScrapeError`]. Skipped references are not errors; they end up in
    /// [`Document::diagnostics`].
    pub async fn scrape(&self, uri: &str) -> ScrapeResult<Document> {
        self.scrape_with_cancellation(uri, &CancellationToken::new())
            .await
    }

    /// Like [`Scraper::scrape`], aborting with [`ScrapeError::Cancelled`] as
    /// soon as `cancel` fires. An in-flight fetch is dropped.
    ///
    /// # Errors
    ///
    /// See [`ScrapeError`].
    pub async fn scrape_with_cancellation(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> ScrapeResult<Document> {
        let mut state = ResolutionState::new(parse_target(uri)?, self.max_hops);
        let mut diagnostics = Vec::new();

        loop {
            let requested = state.begin_fetch(&mut diagnostics);
            info!(
                url = %requested,
                remaining_hops = state.remaining_hops(),
                "fetching document"
            );

            let page = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                result = self.source.fetch(&requested) => result?,
            };
            state.adopt_effective(&requested, &page.effective_url);

            let ctx = ExtractContext {
                document_url: state.current_url(),
                escaped_fragment_active: state.escaped_fragment_url().is_some(),
                remaining_hops: state.remaining_hops(),
            };
            let Extraction { preview, outcome } = extract(&page.body, &ctx, &mut diagnostics)?;

            match outcome {
                ExtractOutcome::Redirect(RedirectTrigger::Refresh(target)) => {
                    info!(%target, "following http-equiv refresh");
                    state.redirect_to(target);
                }
                ExtractOutcome::Redirect(RedirectTrigger::Canonical(target)) => {
                    info!(%target, "following canonical link");
                    state.redirect_to(target);
                }
                ExtractOutcome::Redirect(RedirectTrigger::EscapedFragment) => {
                    info!(url = %state.current_url(), "following escaped-fragment hint");
                    if !state.escape_current(&mut diagnostics) {
                        return Ok(settle(page, preview, diagnostics));
                    }
                }
                ExtractOutcome::Exhausted | ExtractOutcome::Complete | ExtractOutcome::Halted => {
                    debug!(?outcome, url = %page.effective_url, "document settled");
                    return Ok(settle(page, preview, diagnostics));
                }
            }
        }
    }
}

fn settle(page: FetchedPage, preview: DocumentPreview, diagnostics: Vec<Diagnostic>) -> Document {
    Document {
        body: page.body,
        headers: page.headers,
        effective_url: page.effective_url,
        preview,
        diagnostics,
    }
}

fn parse_target(uri: &str) -> ScrapeResult<Url> {
    let uri = uri.trim();
    let url = Url::parse(uri).map_err(|source| ScrapeError::InvalidUrl {
        url: uri.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScrapeError::UnsupportedScheme {
            url: uri.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}
