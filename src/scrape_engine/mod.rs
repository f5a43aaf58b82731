//! Scrape engine
//!
//! Owns the resolution state of one `scrape` call and drives the
//! fetch → extract → redirect loop until a document settles or the hop
//! budget runs out.

// Sub-modules
pub mod scrape_types;
pub mod scraper;
pub mod state;

// Re-exports for public API
pub use scrape_types::{ScrapeError, ScrapeResult};
pub use scraper::Scraper;
pub use state::ResolutionState;
