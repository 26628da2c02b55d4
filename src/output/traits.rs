//! Exporter traits and errors
//!
//! An exporter persists a finished crawl. The crawl itself never depends on
//! an exporter; the binary picks one from the configured output format.

use crate::crawler::CrawlReport;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persists the records of a crawl report
pub trait RecordExporter {
    /// Writes every record of `report`, returning how many rows were written
    fn export(&mut self, report: &CrawlReport) -> OutputResult<usize>;
}
