//! Configuration for link preview scraping
//!
//! `ScrapeConfig` carries the hop budget and the transport settings shared by
//! every document source. Build one with [`ScrapeConfig::builder`]; the
//! builder validates at `build()`.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::ScrapeConfigBuilder;
pub use types::ScrapeConfig;
