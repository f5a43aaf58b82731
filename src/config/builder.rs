//! Fluent builder for `ScrapeConfig`
//!
//! Every field has a default, so `ScrapeConfig::builder().build()` is valid.
//! Values are checked once, at `build()`.

use serde::Deserialize;
use tracing::warn;

use super::types::ScrapeConfig;
use crate::scrape_engine::{ScrapeError, ScrapeResult};
use crate::utils::{DEFAULT_MAX_HOPS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfigBuilder {
    pub(crate) max_hops: u32,
    pub(crate) request_timeout_secs: u64,
    pub(crate) user_agent: String,
    pub(crate) accept_invalid_certs: bool,
}

impl Default for ScrapeConfigBuilder {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder {
    /// Set the hop budget: the number of fetches one `scrape` call may make.
    ///
    /// The first fetch consumes a hop, so `1` means "never follow a refresh,
    /// canonical link or fragment hint". `0` behaves like `1`: the initial
    /// fetch always happens.
    #[must_use]
    pub fn max_hops(mut self, hops: u32) -> Self {
        self.max_hops = hops;
        self
    }

    /// Per-fetch timeout in seconds. Must be non-zero.
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Skip TLS certificate verification for `https` targets.
    ///
    /// Link previews are often generated for arbitrary third-party sites
    /// with expired or self-signed certificates. Enabling this accepts such
    /// sites at the cost of no longer authenticating the server.
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_linkpreview::config::ScrapeConfig;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ScrapeConfig::builder()
    ///     .accept_invalid_certs(true)
    ///     .build()?;
    /// assert!(config.accept_invalid_certs());
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Validate and produce the config.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Config`] for a zero timeout or a blank user agent.
    pub fn build(self) -> ScrapeResult<ScrapeConfig> {
        if self.request_timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let user_agent = self.user_agent.trim().to_string();
        if user_agent.is_empty() {
            return Err(ScrapeError::Config("user_agent must not be empty".to_string()));
        }

        if self.accept_invalid_certs {
            warn!("TLS certificate verification disabled for https targets");
        }

        Ok(ScrapeConfig {
            max_hops: self.max_hops,
            request_timeout_secs: self.request_timeout_secs,
            user_agent,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }
}

impl TryFrom<ScrapeConfigBuilder> for ScrapeConfig {
    type Error = ScrapeError;

    fn try_from(builder: ScrapeConfigBuilder) -> ScrapeResult<Self> {
        builder.build()
    }
}
