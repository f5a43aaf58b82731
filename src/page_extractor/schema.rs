use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::resolver::{UriRef, UrlResolver};

/// Link preview fields gathered from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPreview {
    pub icon: UriRef,
    pub name: String,
    pub title: String,
    pub description: String,
    pub images: Vec<UriRef>,
    pub css_files: Vec<UriRef>,
    pub js_files: Vec<UriRef>,
    pub link: String,
}

impl DocumentPreview {
    /// Defaults for a document at `url`: host as name, `/favicon.ico` on the
    /// same origin as icon, the URL itself as link.
    #[must_use]
    pub fn for_url(url: &Url) -> Self {
        let mut icon = UrlResolver::for_document(url).origin().clone();
        icon.set_path("/favicon.ico");

        Self {
            icon: UriRef::from(icon),
            name: host_with_port(url),
            title: String::new(),
            description: String::new(),
            images: Vec::new(),
            css_files: Vec::new(),
            js_files: Vec::new(),
            link: url.to_string(),
        }
    }
}

fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Which step produced a [`Diagnostic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    /// An href/src/content reference was dropped
    Resolve,
    /// A refresh target could not be followed; parsing stopped
    RefreshTarget,
    /// A canonical target was not an http(s) URL
    CanonicalTarget,
    /// Escaped-fragment rewriting failed; the logical URL was used
    EscapedFragment,
}

/// A non-fatal problem met while scraping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The reference or URL as written
    pub reference: String,
    pub stage: DiagnosticStage,
    pub message: String,
}

/// The final document of a scrape
#[derive(Debug, Clone)]
pub struct Document {
    /// Body as UTF-8 text
    pub body: String,
    pub headers: HeaderMap,
    /// Where the last fetch landed
    pub effective_url: Url,
    pub preview: DocumentPreview,
    /// Non-fatal problems from every hop, oldest first
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }
}
