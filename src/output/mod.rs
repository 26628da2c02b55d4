//! Output module for persisting and summarizing harvest results
//!
//! This module handles:
//! - Exporting records as CSV or into a SQLite database
//! - Deriving statistics from a finished crawl

mod csv_output;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_output::CsvExporter;
pub use sqlite_output::SqliteExporter;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordExporter};

use crate::config::{OutputConfig, OutputFormat};
use crate::crawler::CrawlReport;
use crate::HarvestError;
use std::path::Path;

/// Exports a report in the configured format
///
/// # Arguments
///
/// * `output` - Output section of the configuration
/// * `path` - Destination, overriding `output.path`
/// * `report` - The finished crawl
/// * `config_hash` - Hash of the configuration, kept alongside SQLite runs
///
/// # Returns
///
/// * `Ok(usize)` - Number of records written
/// * `Err(HarvestError)` - The destination could not be written
pub fn export_report(
    output: &OutputConfig,
    path: Option<&Path>,
    report: &CrawlReport,
    config_hash: &str,
) -> Result<usize, HarvestError> {
    let path = path.unwrap_or_else(|| Path::new(&output.path));

    let written = match output.format {
        OutputFormat::Csv => CsvExporter::create(path)?.export(report)?,
        OutputFormat::Sqlite => SqliteExporter::open(path, config_hash)?.export(report)?,
    };

    tracing::info!("Exported {} records to {}", written, path.display());
    Ok(written)
}
