//! `data:` URI decoding
//!
//! Grammar: `data:[<mediatype>][;base64],<data>`. Only the pieces a link
//! preview needs are kept: the media type split into type and subtype, the
//! base64 flag, and the decoded payload bytes.
//!
//! ```text
//! data:,plain text
//! data:text/html,<p>inline</p>
//! data:text/css;base64,Ym9keXt9
//! data:image/x-icon;base64,AAABAAEAEBA...
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Errors raised while decoding a `data:` URI
#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    /// Input does not start with `data:`
    #[error("not a data URI: missing `data:` prefix")]
    MissingPrefix,

    /// No comma separates the metadata from the payload
    #[error("malformed data URI: missing `,` before payload")]
    MissingComma,

    /// Payload flagged as base64 but failed to decode
    #[error("base64 payload failed to decode: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decoded inline resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUri {
    /// Top-level media type (`image`, `text`), empty when omitted
    pub media_type: String,
    /// Media subtype; `x-icon` is reported as `icon`
    pub subtype: String,
    /// Whether the payload was base64 encoded
    pub is_base64: bool,
    /// Payload bytes after base64 decoding (raw bytes otherwise)
    pub data: Vec<u8>,
}

impl DataUri {
    /// Decode a raw `data:` URI string.
    ///
    /// The metadata prefix is everything before the first comma; its `;`
    /// separated segments are either the literal `base64` or a
    /// `<type>/<subtype>` pair. Unknown segments such as `charset=utf-8`
    /// are ignored.
    ///
    /// # Errors
    ///
    /// See [`DataUriError`].
    pub fn decode(src: &str) -> Result<Self, DataUriError> {
        let rest = src
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &src[5..])
            .ok_or(DataUriError::MissingPrefix)?;
        let (meta, payload) = rest.split_once(',').ok_or(DataUriError::MissingComma)?;

        let mut uri = Self::default();
        for segment in meta.split(';') {
            if segment == "base64" {
                uri.is_base64 = true;
                continue;
            }
            if let Some((media_type, subtype)) = segment.split_once('/')
                && !subtype.contains('/')
            {
                uri.media_type = media_type.to_string();
                uri.subtype = normalize_subtype(subtype).to_string();
            }
        }

        uri.data = if uri.is_base64 {
            STANDARD.decode(payload)?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(uri)
    }

    /// `type/subtype` as written (after subtype normalization)
    #[must_use]
    pub fn mime(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }
}

#[inline]
fn normalize_subtype(subtype: &str) -> &str {
    if subtype == "x-icon" { "icon" } else { subtype }
}
