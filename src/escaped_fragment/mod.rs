//! AJAX crawling scheme (`#!` → `_escaped_fragment_=`)
//!
//! Deprecated, but still honoured by some single-page sites that serve a
//! static snapshot to crawlers. A hash-bang URL such as
//! `http://example.com/#!page=2` is requested as
//! `http://example.com/?_escaped_fragment_=page=2`, and a page announcing
//! `<meta name="fragment" content="!">` is re-requested with an empty
//! `_escaped_fragment_=` parameter.

use url::Url;

use crate::utils::{ESCAPED_FRAGMENT, HASH_BANG};

/// Errors raised while rewriting a URL into its escaped-fragment form
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// Percent-decoding produced invalid UTF-8
    #[error("URL is not valid UTF-8 once percent-decoded: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The rewritten URL no longer parses
    #[error("escaped-fragment URL '{url}' is invalid: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Rewrite `url` into the URL a crawler should actually request.
///
/// The whole URL is percent-decoded first. If it carries a `#!` fragment,
/// the payload after the marker is re-escaped (see [`escape_fragment`]) and
/// moved into an `_escaped_fragment_` query parameter. Without a marker an
/// empty `_escaped_fragment_=` parameter is appended. The parameter is
/// introduced with `&` when the URL already has a query, `?` otherwise.
///
/// # Errors
///
/// Returns [`FragmentError`] when the decoded URL is not UTF-8 or the
/// rewritten URL fails to parse.
pub fn to_escaped_fragment_url(url: &Url) -> Result<Url, FragmentError> {
    let decoded = urlencoding::decode(url.as_str())?;
    let separator = if url.query().is_some_and(|q| !q.is_empty()) {
        '&'
    } else {
        '?'
    };

    let rewritten = match decoded.find(HASH_BANG) {
        Some(idx) => format!(
            "{}{separator}{ESCAPED_FRAGMENT}{}",
            &decoded[..idx],
            escape_fragment(&decoded[idx + HASH_BANG.len()..])
        ),
        None => format!("{decoded}{separator}{ESCAPED_FRAGMENT}"),
    };

    Url::parse(&rewritten).map_err(|source| FragmentError::Parse {
        url: rewritten.clone(),
        source,
    })
}

/// Escape a hash-bang payload byte by byte.
///
/// Control bytes (0–31, 127) are dropped; space, `#`, `%`, `&`, `+` and
/// every byte ≥ 128 are percent-encoded; everything else passes through.
#[must_use]
pub fn escape_fragment(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for &byte in payload.as_bytes() {
        if is_control(byte) {
            continue;
        }
        if is_unsafe(byte) {
            out.push_str(&format!("%{byte:02X}"));
        } else {
            out.push(char::from(byte));
        }
    }
    out
}

#[inline]
fn is_control(byte: u8) -> bool {
    byte <= 31 || byte == 127
}

#[inline]
fn is_unsafe(byte: u8) -> bool {
    matches!(byte, b' ' | b'#' | b'%' | b'&' | b'+') || byte >= 127
}
