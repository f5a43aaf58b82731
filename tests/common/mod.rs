//! Test utilities and helper functions for the linkpreview test suite

use std::collections::HashMap;
use std::sync::Mutex;

use kodegen_tools_linkpreview::{DocumentSource, FetchError, FetchedPage};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates an HTML document from head and body markup
#[allow(dead_code)]
pub fn html_page(head: &str, body: &str) -> String {
    format!("<!DOCTYPE html>\n<html>\n<head>\n{head}\n</head>\n<body>\n{body}\n</body>\n</html>")
}

struct StaticPage {
    landed: Url,
    body: String,
}

/// In-memory document source keyed by request URL
///
/// Records every URL it is asked for, in order.
#[allow(dead_code)]
#[derive(Default)]
pub struct StaticSource {
    pages: HashMap<String, StaticPage>,
    fetches: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`
    pub fn page(self, url: &str, html: impl Into<String>) -> Self {
        self.redirect(url, url, html)
    }

    /// Serve `html` for requests to `from`, reporting `to` as the landed URL
    pub fn redirect(mut self, from: &str, to: &str, html: impl Into<String>) -> Self {
        let from = Url::parse(from).expect("valid test URL");
        let landed = Url::parse(to).expect("valid test URL");
        self.pages.insert(
            from.to_string(),
            StaticPage {
                landed,
                body: html.into(),
            },
        );
        self
    }

    /// URLs requested so far
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().expect("fetch log poisoned").clone()
    }
}

impl DocumentSource for StaticSource {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetches
            .lock()
            .expect("fetch log poisoned")
            .push(url.to_string());

        let page = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| FetchError::Unavailable {
                url: url.to_string(),
                reason: "no page registered".to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("text/html; charset=utf-8"),
        );

        Ok(FetchedPage {
            effective_url: page.landed.clone(),
            headers,
            body: page.body.clone(),
        })
    }
}

/// Source whose fetches never complete
#[allow(dead_code)]
pub struct PendingSource;

impl DocumentSource for PendingSource {
    async fn fetch(&self, _url: &Url) -> Result<FetchedPage, FetchError> {
        std::future::pending().await
    }
}
