//! Streaming metadata extraction
//!
//! One pass over the token stream fills a [`DocumentPreview`] and watches for
//! signals that the fetched document is not the real one. After every tag the
//! triggers are checked in fixed priority order:
//!
//! 1. `<meta http-equiv="refresh">` target
//! 2. `<link rel="canonical">` pointing elsewhere
//! 3. `<meta name="fragment" content="!">` (AJAX crawling hint)
//! 4. early completion: title, description and `og:image` all known
//!
//! Redirect triggers only fire once the head is over and hops remain. The
//! first one that fires ends the pass; acting on it is the scraper's job.

use std::collections::HashSet;

use html_escape::decode_html_entities;
use tracing::{debug, warn};
use url::Url;

use super::schema::{Diagnostic, DiagnosticStage, DocumentPreview};
use super::tokens::{Token, TokenStream};
use crate::resolver::{UriRef, UrlResolver};
use crate::scrape_engine::{ScrapeError, ScrapeResult};
use crate::utils::{clean_str, trim_quotes};

/// Why the current document should be replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTrigger {
    /// `http-equiv` refresh, target resolved against the document origin
    Refresh(Url),
    /// Canonical link, target resolved against the document URL
    Canonical(Url),
    /// Fragment hint: refetch the current URL in escaped-fragment form
    EscapedFragment,
}

/// How an extraction pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Token stream ran out
    Exhausted,
    /// Title, description and `og:image` were all found after the head
    Complete,
    /// A refresh target could not be followed; preview is as populated
    Halted,
    Redirect(RedirectTrigger),
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub preview: DocumentPreview,
    pub outcome: ExtractOutcome,
}

/// What the extractor needs to know about the resolution state
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// URL the document is considered to live at
    pub document_url: &'a Url,
    /// An escaped-fragment URL was used for this fetch
    pub escaped_fragment_active: bool,
    /// Hops left after this document's fetch
    pub remaining_hops: u32,
}

/// Run one extraction pass over `html`.
///
/// Dropped references are appended to `diagnostics` and never stop the pass.
///
/// # Errors
///
/// [`ScrapeError::InvalidCanonical`] when a canonical href cannot be parsed
/// as a URL, even relative to the document.
pub fn extract(
    html: &str,
    ctx: &ExtractContext<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> ScrapeResult<Extraction> {
    let mut extractor = MetadataExtractor::new(ctx, diagnostics);
    let mut tokens = TokenStream::new(html);

    while let Some(token) = tokens.next() {
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => extractor.on_start_tag(&name, &attrs, self_closing, &mut tokens)?,
            Token::EndTag { name } => extractor.on_end_tag(&name),
            Token::Text(_) => continue,
        }

        if let Some(outcome) = extractor.check_triggers() {
            return Ok(extractor.finish(outcome));
        }
    }

    Ok(extractor.finish(ExtractOutcome::Exhausted))
}

struct MetadataExtractor<'c, 'd> {
    ctx: &'c ExtractContext<'c>,
    resolver: UrlResolver,
    preview: DocumentPreview,
    diagnostics: &'d mut Vec<Diagnostic>,
    head_passed: bool,
    og_image_seen: bool,
    fragment_hint: bool,
    canonical: Option<Url>,
    /// Raw refresh target; empty when the tag had no `url=` part
    refresh: Option<String>,
    seen_css: HashSet<String>,
    seen_js: HashSet<String>,
}

impl<'c, 'd> MetadataExtractor<'c, 'd> {
    fn new(ctx: &'c ExtractContext<'c>, diagnostics: &'d mut Vec<Diagnostic>) -> Self {
        Self {
            ctx,
            resolver: UrlResolver::for_document(ctx.document_url),
            preview: DocumentPreview::for_url(ctx.document_url),
            diagnostics,
            head_passed: false,
            og_image_seen: false,
            fragment_hint: false,
            canonical: None,
            refresh: None,
            seen_css: HashSet::new(),
            seen_js: HashSet::new(),
        }
    }

    fn finish(self, outcome: ExtractOutcome) -> Extraction {
        Extraction {
            preview: self.preview,
            outcome,
        }
    }

    fn on_start_tag(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
        self_closing: bool,
        tokens: &mut TokenStream<'_>,
    ) -> ScrapeResult<()> {
        match name {
            "body" => self.head_passed = true,
            "link" => self.on_link(attrs)?,
            "script" => self.on_script(attrs),
            "meta" => self.on_meta(attrs),
            "title" if !self_closing => {
                // Whatever comes next is the title, even a tag
                if let Some(next) = tokens.next()
                    && self.preview.title.is_empty()
                {
                    self.preview.title = decode_html_entities(next.payload()).into_owned();
                }
            }
            "img" => {
                for (key, value) in attrs {
                    if clean_str(key) == "src"
                        && let Some(image) = self.resolve(value.trim())
                    {
                        self.preview.images.push(image);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end_tag(&mut self, name: &str) {
        if matches!(name, "head" | "body") {
            self.head_passed = true;
        }
    }

    fn on_link(&mut self, attrs: &[(String, String)]) -> ScrapeResult<()> {
        let mut rel = String::new();
        let mut href = String::new();
        for (key, value) in attrs {
            match clean_str(key).as_str() {
                "rel" => rel = clean_str(value),
                "href" => href = value.trim().to_string(),
                _ => {}
            }
        }
        if rel.is_empty() || href.is_empty() {
            return Ok(());
        }

        if rel == "canonical" {
            self.record_canonical(&href)?;
        }

        if rel.contains("icon")
            && let Some(icon) = self.resolve(&href)
        {
            self.preview.icon = icon;
        }

        if rel.contains("stylesheet")
            && self.seen_css.insert(href.clone())
            && let Some(css) = self.resolve(&href)
        {
            self.preview.css_files.push(css);
        }

        Ok(())
    }

    fn record_canonical(&mut self, href: &str) -> ScrapeResult<()> {
        let target =
            self.ctx
                .document_url
                .join(href)
                .map_err(|source| ScrapeError::InvalidCanonical {
                    href: href.to_string(),
                    source,
                })?;

        if without_fragment(&target) == without_fragment(self.ctx.document_url) {
            return Ok(());
        }

        if matches!(target.scheme(), "http" | "https") {
            debug!(canonical = %target, "canonical link points elsewhere");
            self.canonical = Some(target);
        } else {
            self.diagnose(
                href,
                DiagnosticStage::CanonicalTarget,
                format!("canonical target '{target}' is not an http(s) URL"),
            );
        }
        Ok(())
    }

    fn on_script(&mut self, attrs: &[(String, String)]) {
        let mut kind = String::new();
        let mut src = String::new();
        for (key, value) in attrs {
            match clean_str(key).as_str() {
                "type" => kind = value.trim().to_string(),
                "src" => src = value.trim().to_string(),
                _ => {}
            }
        }
        if src.is_empty() {
            return;
        }

        if (kind.ends_with("javascript") || src.ends_with("js"))
            && self.seen_js.insert(src.clone())
            && let Some(js) = self.resolve(&src)
        {
            self.preview.js_files.push(js);
        }
    }

    fn on_meta(&mut self, attrs: &[(String, String)]) {
        if attrs.len() != 2 {
            return;
        }

        let mut property = String::new();
        let mut name = "";
        let mut content = "";
        let mut is_refresh = false;
        for (key, value) in attrs {
            match clean_str(key).as_str() {
                "property" => property = clean_str(value),
                "name" => {
                    name = value.as_str();
                    property = clean_str(value);
                }
                "http-equiv" => is_refresh = clean_str(value) == "refresh",
                "content" => content = value.as_str(),
                _ => {}
            }
        }

        if name == "fragment" && content == "!" && !self.ctx.escaped_fragment_active {
            self.fragment_hint = true;
        }

        if is_refresh {
            self.refresh = Some(refresh_target(content).to_string());
        }

        match property.as_str() {
            "og:site_name" => self.preview.name = content.to_string(),
            "og:title" => self.preview.title = content.to_string(),
            "og:description" => self.preview.description = content.to_string(),
            "description" if self.preview.description.is_empty() => {
                self.preview.description = content.to_string();
            }
            "og:url" => self.preview.link = content.to_string(),
            "og:image" => {
                self.og_image_seen = true;
                if let Some(image) = self.resolve(content) {
                    self.preview.images.push(image);
                }
            }
            _ => {}
        }
    }

    fn check_triggers(&mut self) -> Option<ExtractOutcome> {
        let can_hop = self.head_passed && self.ctx.remaining_hops > 0;

        if can_hop && let Some(target) = self.refresh.take() {
            return Some(self.follow_refresh(&target));
        }

        if can_hop && let Some(canonical) = self.canonical.take() {
            return Some(ExtractOutcome::Redirect(RedirectTrigger::Canonical(canonical)));
        }

        if can_hop && self.fragment_hint {
            return Some(ExtractOutcome::Redirect(RedirectTrigger::EscapedFragment));
        }

        if self.head_passed
            && self.og_image_seen
            && !self.preview.title.is_empty()
            && !self.preview.description.is_empty()
        {
            debug!(url = %self.ctx.document_url, "preview complete, skipping rest of document");
            return Some(ExtractOutcome::Complete);
        }

        None
    }

    fn follow_refresh(&mut self, target: &str) -> ExtractOutcome {
        match self.resolver.resolve(target) {
            Ok(UriRef::Remote { url }) if matches!(url.scheme(), "http" | "https") => {
                ExtractOutcome::Redirect(RedirectTrigger::Refresh(url))
            }
            Ok(other) => {
                self.diagnose(
                    target,
                    DiagnosticStage::RefreshTarget,
                    format!("refresh target has unsupported scheme '{}'", other.schema()),
                );
                ExtractOutcome::Halted
            }
            Err(e) => {
                self.diagnose(target, DiagnosticStage::RefreshTarget, e.to_string());
                ExtractOutcome::Halted
            }
        }
    }

    fn resolve(&mut self, reference: &str) -> Option<UriRef> {
        match self.resolver.resolve(reference) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                self.diagnose(reference, DiagnosticStage::Resolve, e.to_string());
                None
            }
        }
    }

    fn diagnose(&mut self, reference: &str, stage: DiagnosticStage, message: String) {
        warn!(reference, ?stage, "{message}");
        self.diagnostics.push(Diagnostic {
            reference: reference.to_string(),
            stage,
            message,
        });
    }
}

/// Target of a refresh `content` value such as `0; URL='next.html'`.
///
/// Every `;` segment containing `url=` (case-insensitive) is considered and
/// the last one wins. The text after the marker is unquoted and keeps its
/// original case: only the marker is matched case-insensitively, so paths
/// on case-sensitive servers survive. No such segment yields an empty
/// target.
fn refresh_target(content: &str) -> &str {
    content
        .trim()
        .rsplit(';')
        .find_map(|segment| {
            let idx = segment.to_ascii_lowercase().find("url=")?;
            Some(trim_quotes(&segment[idx + "url=".len()..]))
        })
        .unwrap_or("")
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
