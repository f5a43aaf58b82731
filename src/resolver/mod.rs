//! Reference resolution
//!
//! Turns the href/src strings found in markup into absolute, scheme-tagged
//! references. Relative references are joined against the document origin
//! (scheme, host and port only), absolute ones are kept, and `data:` URIs
//! are decoded in place.

pub mod data_uri;

use serde::{Deserialize, Serialize};
use url::Url;

pub use data_uri::{DataUri, DataUriError};

/// Resolution failure for a single reference
///
/// Never fatal for a document: the extractor records it as a diagnostic and
/// drops the reference.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// `data:` URI present but undecodable
    #[error("invalid data URI: {0}")]
    DataUri(#[from] DataUriError),

    /// Reference could not be parsed or joined
    #[error("invalid reference '{reference}': {source}")]
    Parse {
        reference: String,
        #[source]
        source: url::ParseError,
    },
}

/// A resolved reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UriRef {
    /// Absolute URL (http, https, or whatever absolute scheme was written)
    Remote { url: Url },
    /// Inline `data:` payload
    Data(DataUri),
}

impl UriRef {
    /// Scheme tag: the URL scheme, or `data`
    #[must_use]
    pub fn schema(&self) -> &str {
        match self {
            Self::Remote { url } => url.scheme(),
            Self::Data(_) => "data",
        }
    }

    /// Absolute URL string for remote references
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Remote { url } => Some(url.as_str()),
            Self::Data(_) => None,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Remote { url } => Some(url),
            Self::Data(_) => None,
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&DataUri> {
        match self {
            Self::Remote { .. } => None,
            Self::Data(data) => Some(data),
        }
    }

    /// True for `http`/`https` references, the only ones worth fetching
    #[must_use]
    pub fn is_http(&self) -> bool {
        matches!(self.schema(), "http" | "https")
    }
}

impl From<Url> for UriRef {
    fn from(url: Url) -> Self {
        Self::Remote { url }
    }
}

/// Resolves references against one document origin
#[derive(Debug, Clone)]
pub struct UrlResolver {
    origin: Url,
}

impl UrlResolver {
    /// Resolver for references found in the document at `document_url`.
    ///
    /// Only the origin is kept: path, query, fragment and credentials are
    /// dropped, so `img/a.png` on `http://h/x/y` resolves to `http://h/img/a.png`.
    #[must_use]
    pub fn for_document(document_url: &Url) -> Self {
        let mut origin = document_url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        // Fails only for cannot-be-a-base URLs, which carry no credentials
        let _ = origin.set_username("");
        let _ = origin.set_password(None);
        Self { origin }
    }

    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve `reference` as written in the markup.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the reference is not a parseable URL or
    /// is a malformed `data:` URI. Callers skip the reference.
    pub fn resolve(&self, reference: &str) -> Result<UriRef, ResolveError> {
        let reference = reference.trim();
        match Url::parse(reference) {
            Ok(url) if url.scheme() == "data" => Ok(UriRef::Data(DataUri::decode(reference)?)),
            Ok(url) => Ok(UriRef::Remote { url }),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .origin
                .join(reference)
                .map(|url| UriRef::Remote { url })
                .map_err(|source| ResolveError::Parse {
                    reference: reference.to_string(),
                    source,
                }),
            Err(source) => Err(ResolveError::Parse {
                reference: reference.to_string(),
                source,
            }),
        }
    }
}
