//! HTTP document source backed by `reqwest`

use std::time::Duration;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tracing::debug;
use url::Url;

use super::{DocumentSource, FetchError, FetchedPage};
use crate::config::ScrapeConfig;

/// Plain GET with transport redirects followed by the client.
///
/// The body is transcoded to UTF-8 (see [`decode_body`] for how the source
/// encoding is picked). Non-2xx responses are not errors: their body is
/// still a document and gets parsed like any other.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    /// Build a client from the transport settings in `config`.
    ///
    /// # Errors
    ///
    /// [`FetchError::Client`] when the TLS backend fails to initialise.
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent())
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing client, e.g. one shared with the rest of an application.
    ///
    /// `timeout` is only used to report [`FetchError::Timeout`]; the client's
    /// own timeout settings apply.
    #[must_use]
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn classify(&self, url: &Url, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

impl DocumentSource for HttpSource {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "non-success status, parsing body anyway");
        }

        let effective_url = response.url().clone();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| self.classify(url, e))?;
        let body = decode_body(&headers, &bytes);

        debug!(%url, landed = %effective_url, bytes = bytes.len(), "document fetched");

        Ok(FetchedPage {
            effective_url,
            headers,
            body,
        })
    }
}

/// Bytes of the body searched for an in-document charset declaration
const PRESCAN_LEN: usize = 1024;

/// Transcode a response body to UTF-8.
///
/// A byte-order mark wins. Otherwise the `Content-Type` charset is used,
/// then a `charset=` declaration in the first 1024 bytes of markup
/// (`<meta charset>` or an `http-equiv` content type). With no usable
/// label, valid UTF-8 stays UTF-8 and anything else is read as
/// windows-1252. Malformed sequences become U+FFFD.
fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> String {
    let encoding = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label_no_replacement(label.as_bytes()))
        .or_else(|| {
            let head = &bytes[..bytes.len().min(PRESCAN_LEN)];
            charset_label(&String::from_utf8_lossy(head))
                .and_then(|label| Encoding::for_label_no_replacement(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            if std::str::from_utf8(bytes).is_ok() {
                UTF_8
            } else {
                WINDOWS_1252
            }
        });

    let (text, used, malformed) = encoding.decode(bytes);
    if malformed {
        debug!(encoding = used.name(), "body had malformed sequences");
    }
    text.into_owned()
}

/// Value of the first `charset=` parameter in `text`, unquoted
fn charset_label(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let label: String = lower[start..]
        .trim_start_matches(['"', '\'', ' '])
        .chars()
        .take_while(|c| !matches!(c, '"' | '\'' | ';' | '>' | '/') && !c.is_whitespace())
        .collect();
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn html_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers
    }

    #[test]
    fn charset_label_variants() {
        assert_eq!(charset_label("text/html; charset=UTF-8").as_deref(), Some("utf-8"));
        assert_eq!(charset_label(r#"<meta charset="gbk">"#).as_deref(), Some("gbk"));
        assert_eq!(
            charset_label(r#"<meta http-equiv="Content-Type" content="text/html; charset='iso-8859-1'">"#)
                .as_deref(),
            Some("iso-8859-1")
        );
        assert_eq!(charset_label("text/html"), None);
        assert_eq!(charset_label("charset="), None);
    }

    #[test]
    fn header_charset_beats_markup() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=windows-1252"),
        );
        let body = b"<meta charset=\"utf-8\"><p>\x93q\x94</p>";
        assert_eq!(
            decode_body(&headers, body),
            "<meta charset=\"utf-8\"><p>\u{201c}q\u{201d}</p>"
        );
    }

    #[test]
    fn bom_overrides_declarations() {
        let body = b"\xEF\xBB\xBF<meta charset=\"iso-8859-1\">caf\xC3\xA9";
        assert_eq!(
            decode_body(&html_headers(), body),
            "<meta charset=\"iso-8859-1\">caf\u{e9}"
        );
    }

    #[test]
    fn undeclared_non_utf8_falls_back_to_windows_1252() {
        assert_eq!(decode_body(&html_headers(), b"caf\xE9"), "caf\u{e9}");
        assert_eq!(decode_body(&HeaderMap::new(), "caf\u{e9}".as_bytes()), "caf\u{e9}");
    }
}
