//! Per-call resolution state: which URL is the document, which URL is
//! actually requested, and how many fetches are left.

use tracing::{info, warn};
use url::Url;

use crate::escaped_fragment::to_escaped_fragment_url;
use crate::page_extractor::{Diagnostic, DiagnosticStage};
use crate::utils::{ESCAPED_FRAGMENT, HASH_BANG};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionState {
    /// Logical document URL
    current_url: Url,
    /// Overrides `current_url` for requests while set
    escaped_fragment_url: Option<Url>,
    remaining_hops: u32,
}

impl ResolutionState {
    #[must_use]
    pub fn new(url: Url, max_hops: u32) -> Self {
        Self {
            current_url: url,
            escaped_fragment_url: None,
            remaining_hops: max_hops,
        }
    }

    #[must_use]
    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    #[must_use]
    pub fn escaped_fragment_url(&self) -> Option<&Url> {
        self.escaped_fragment_url.as_ref()
    }

    #[must_use]
    pub fn remaining_hops(&self) -> u32 {
        self.remaining_hops
    }

    /// URL to put on the wire: the escaped-fragment form when one is set
    #[must_use]
    pub fn request_url(&self) -> &Url {
        self.escaped_fragment_url.as_ref().unwrap_or(&self.current_url)
    }

    /// Consume a hop and settle the URL for the next fetch.
    ///
    /// A `#!` URL is requested in escaped-fragment form; a URL that already
    /// carries `_escaped_fragment_=` is its own escaped form.
    pub fn begin_fetch(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Url {
        self.remaining_hops = self.remaining_hops.saturating_sub(1);

        if self.current_url.as_str().contains(HASH_BANG) {
            self.escape_current(diagnostics);
        }
        if self.current_url.as_str().contains(ESCAPED_FRAGMENT) {
            self.escaped_fragment_url = Some(self.current_url.clone());
        }

        self.request_url().clone()
    }

    /// Compute the escaped-fragment form of the current URL.
    ///
    /// On failure the override is left untouched, a diagnostic is recorded,
    /// and `false` is returned.
    pub fn escape_current(&mut self, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match to_escaped_fragment_url(&self.current_url) {
            Ok(escaped) => {
                self.escaped_fragment_url = Some(escaped);
                true
            }
            Err(e) => {
                warn!(url = %self.current_url, "escaped-fragment rewrite failed: {e}");
                diagnostics.push(Diagnostic {
                    reference: self.current_url.to_string(),
                    stage: DiagnosticStage::EscapedFragment,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// The server redirected us: its answer becomes the logical URL.
    ///
    /// Returns whether anything changed.
    pub fn adopt_effective(&mut self, requested: &Url, effective: &Url) -> bool {
        if effective == requested {
            return false;
        }
        info!(%requested, %effective, "adopting transport redirect target");
        self.current_url = effective.clone();
        self.escaped_fragment_url = None;
        true
    }

    /// Point the state at a refresh or canonical target.
    pub fn redirect_to(&mut self, target: Url) {
        self.current_url = target;
        self.escaped_fragment_url = None;
    }
}
