//! Core configuration type for scraping

use serde::{Deserialize, Serialize};

use super::builder::ScrapeConfigBuilder;
use crate::utils::{DEFAULT_MAX_HOPS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};

/// Settings for one or more `scrape` calls
///
/// Deserialization goes through [`ScrapeConfigBuilder`], so missing fields
/// take their defaults and the same checks as `build()` apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScrapeConfigBuilder")]
pub struct ScrapeConfig {
    /// Total fetch attempts per call, the first fetch included
    pub(crate) max_hops: u32,
    pub(crate) request_timeout_secs: u64,
    pub(crate) user_agent: String,
    /// Skip TLS certificate verification for `https` targets.
    ///
    /// Off unless explicitly enabled. Turning it on trades authenticity of
    /// the fetched document for reach across misconfigured third-party sites.
    pub(crate) accept_invalid_certs: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}
