//! Sumi-Harvest: a polite catalogue harvester
//!
//! This crate walks the listing pages of a paginated product catalogue, fans out
//! to each item's detail page under a bounded worker pool, optionally pulls the
//! item image, and assembles everything into an ordered table of products.

pub mod config;
pub mod crawler;
pub mod output;
pub mod records;
pub mod schema;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
///
/// These errors only arise while setting a crawl up or writing its results.
/// Failures during the crawl itself are carried as typed markers on the
/// records and on the crawl report instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run, CrawlReport, FetchError, Orchestrator, Termination};
pub use records::{ProductRecord, RecordSink};
pub use schema::{ExtractionSchema, SelectorSchema};
