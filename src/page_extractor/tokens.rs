//! Pull-style tag/text tokens over `lol_html`.
//!
//! `lol_html` is push-based: handlers fire while bytes are written. The
//! metadata state machine wants to pull one token at a time and stop early,
//! so [`TokenStream`] feeds the rewriter lazily, one chunk per refill, and
//! queues whatever the handlers emitted. Stopping iteration stops parsing;
//! the rest of the body is never tokenized.
//!
//! `lol_html` only reports end tags that close an element it saw open. A
//! stray `</head>` or `</body>` still matters to the extractor, so the
//! source bytes between consecutive tokens are scanned for end tags the
//! rewriter skipped, and those are emitted in document order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;

use html_escape::decode_html_entities;
use lol_html::html_content::{Element, EndTag, TextChunk};
use lol_html::{HtmlRewriter, OutputSink, Settings, doc_text, element};
use tracing::warn;

use crate::utils::TOKENIZER_CHUNK_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        /// Lower-cased tag name
        name: String,
        /// Attributes in source order, names lower-cased, values entity-decoded
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// A complete text node (all chunks joined), raw entities included
    Text(String),
}

impl Token {
    /// Tag name for tags, the text itself for text nodes
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name } => name,
            Self::Text(text) => text,
        }
    }
}

/// Tokens with their byte span in the source
type Queue = Rc<RefCell<VecDeque<(Token, Range<usize>)>>>;

struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

/// Lazily tokenized HTML document
pub struct TokenStream<'a> {
    rewriter: Option<HtmlRewriter<'static, NoopSink>>,
    queue: Queue,
    input: &'a [u8],
    offset: usize,
    /// End of the last source span handed out
    scanned: usize,
    /// Skipped end tags found in the gap before the next queued token
    stray: VecDeque<Token>,
}

impl<'a> TokenStream<'a> {
    #[must_use]
    pub fn new(html: &'a str) -> Self {
        let queue: Queue = Rc::new(RefCell::new(VecDeque::new()));
        let element_queue = Rc::clone(&queue);
        let text_queue = Rc::clone(&queue);
        let pending_text = Rc::new(RefCell::new(String::new()));
        let pending_span = Rc::new(RefCell::new(None::<Range<usize>>));

        let element_handler = element!("*", move |el: &mut Element<'_, '_>| {
            let attrs = el
                .attributes()
                .iter()
                .map(|attr| (attr.name(), decode_html_entities(&attr.value()).into_owned()))
                .collect();
            element_queue.borrow_mut().push_back((
                Token::StartTag {
                    name: el.tag_name(),
                    attrs,
                    self_closing: el.is_self_closing(),
                },
                el.source_location().bytes(),
            ));

            let end_queue = Rc::clone(&element_queue);
            if let Some(handlers) = el.end_tag_handlers() {
                handlers.push(Box::new(move |end: &mut EndTag<'_>| {
                    end_queue.borrow_mut().push_back((
                        Token::EndTag {
                            name: end.name().to_ascii_lowercase(),
                        },
                        end.source_location().bytes(),
                    ));
                    Ok(())
                }));
            }
            Ok(())
        });

        let text_handler = doc_text!(move |chunk: &mut TextChunk<'_>| {
            let mut pending = pending_text.borrow_mut();
            let mut span = pending_span.borrow_mut();
            if !chunk.as_str().is_empty() {
                let here = chunk.source_location().bytes();
                *span = Some(match span.take() {
                    Some(open) => open.start..here.end.max(open.end),
                    None => here,
                });
                pending.push_str(chunk.as_str());
            }
            if chunk.last_in_text_node()
                && let Some(text_span) = span.take()
            {
                text_queue
                    .borrow_mut()
                    .push_back((Token::Text(std::mem::take(&mut *pending)), text_span));
            }
            Ok(())
        });

        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element_handler],
                document_content_handlers: vec![text_handler],
                strict: false,
                ..Settings::default()
            },
            NoopSink,
        );

        Self {
            rewriter: Some(rewriter),
            queue,
            input: html.as_bytes(),
            offset: 0,
            scanned: 0,
            stray: VecDeque::new(),
        }
    }

    /// Queue end tags in `input[self.scanned..upto]` the rewriter did not report.
    fn scan_gap(&mut self, upto: usize) {
        if upto > self.scanned {
            let gap = &self.input[self.scanned..upto];
            self.stray.extend(
                skipped_end_tags(gap)
                    .into_iter()
                    .map(|name| Token::EndTag { name }),
            );
        }
        self.scanned = self.scanned.max(upto);
    }
}

/// Names of end tags in a stretch of source that holds no reported token.
///
/// Such stretches only contain markup the rewriter swallowed: comments,
/// doctypes and end tags without a matching open element.
fn skipped_end_tags(gap: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut i = 0;
    while i < gap.len() {
        let rest = &gap[i..];
        if rest.starts_with(b"<!--") {
            i += rest
                .windows(3)
                .skip(4)
                .position(|w| w == b"-->")
                .map_or(rest.len(), |pos| pos + 4 + 3);
        } else if rest.starts_with(b"</") {
            let name_len = rest[2..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric())
                .count();
            if name_len > 0 {
                names.push(String::from_utf8_lossy(&rest[2..2 + name_len]).to_ascii_lowercase());
            }
            i += 2 + name_len;
        } else {
            i += 1;
        }
    }
    names
}

impl Iterator for TokenStream<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.stray.pop_front() {
                return Some(token);
            }

            let queued = self.queue.borrow_mut().pop_front();
            if let Some((token, span)) = queued {
                self.scan_gap(span.start);
                self.scanned = self.scanned.max(span.end);
                self.stray.push_back(token);
                continue;
            }

            let Some(rewriter) = self.rewriter.as_mut() else {
                // Tail after the last token, scanned once
                if self.scanned < self.input.len() {
                    self.scan_gap(self.input.len());
                    continue;
                }
                return None;
            };
            if self.offset < self.input.len() {
                let end = (self.offset + TOKENIZER_CHUNK_SIZE).min(self.input.len());
                let chunk = &self.input[self.offset..end];
                self.offset = end;
                if let Err(e) = rewriter.write(chunk) {
                    warn!("HTML tokenizer stopped early: {e}");
                    self.rewriter = None;
                    self.scanned = self.input.len();
                }
            } else if let Some(rewriter) = self.rewriter.take()
                && let Err(e) = rewriter.end()
            {
                warn!("HTML tokenizer failed to finish: {e}");
            }
        }
    }
}
