//! Shared configuration constants for linkpreview
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default hop budget: 5 fetch attempts per scrape
///
/// Every fetch (the first one included) consumes one hop. Once the budget
/// reaches zero, refresh / canonical / escaped-fragment signals are ignored
/// and parsing finishes on the document already in hand.
pub const DEFAULT_MAX_HOPS: u32 = 5;

/// Default per-request timeout: 5 seconds
///
/// Link previews are best-effort; a slow host should fail fast rather than
/// hold up the caller.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// User agent sent with every preview request
pub const DEFAULT_USER_AGENT: &str = concat!("kodegen-linkpreview/", env!("CARGO_PKG_VERSION"));

/// Query parameter used by the AJAX crawling scheme
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_=";

/// Fragment prefix that marks a hash-bang URL
pub const HASH_BANG: &str = "#!";

/// Bytes handed to the HTML tokenizer per write
///
/// The token stream pulls input lazily, so an early exit after the
/// `<head>` section never tokenizes the rest of a large body.
pub const TOKENIZER_CHUNK_SIZE: usize = 8 * 1024;
