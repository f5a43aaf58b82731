//! Link preview extraction from fetched HTML.
//!
//! This module turns a document body into a [`DocumentPreview`] in a single
//! streaming pass and reports whether the document asked to be replaced by
//! another one (refresh, canonical link, escaped-fragment hint).

// Sub-modules
pub mod metadata;
pub mod schema;
pub mod tokens;

// Re-exports for public API
pub use metadata::{ExtractContext, ExtractOutcome, Extraction, RedirectTrigger, extract};
pub use schema::{Diagnostic, DiagnosticStage, Document, DocumentPreview};
pub use tokens::{Token, TokenStream};
