//! CSV exporter
//!
//! Writes one header row followed by one row per product, columns in the
//! order of [`COLUMNS`].

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputResult, RecordExporter};
use crate::records::COLUMNS;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Exports records as comma separated values
///
/// The header row is written once, before the first exported record; later
/// exports append rows to the same table.
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl CsvExporter<File> {
    /// Creates the file at `path`, along with any missing parent directories
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> CsvExporter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            header_written: false,
        }
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.to_string()).into())
    }
}

impl<W: Write> RecordExporter for CsvExporter<W> {
    fn export(&mut self, report: &CrawlReport) -> OutputResult<usize> {
        if !self.header_written {
            self.writer.write_record(COLUMNS)?;
            self.header_written = true;
        }

        for record in &report.records {
            self.writer.write_record(record.to_row())?;
        }

        self.writer.flush()?;
        tracing::debug!("Wrote {} CSV rows", report.records.len());
        Ok(report.records.len())
    }
}
