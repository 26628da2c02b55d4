//! SQLite exporter
//!
//! Every export is recorded as a run; products reference the run they were
//! harvested in, so one database can hold the history of many crawls.

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputResult, RecordExporter};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the export database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    termination TEXT NOT NULL,
    clean INTEGER NOT NULL,
    pages_crawled INTEGER NOT NULL,
    record_count INTEGER NOT NULL
);

-- Harvested products, in crawl order within a run
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_index INTEGER NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    price TEXT NOT NULL,
    image TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    details TEXT NOT NULL,
    detail_error TEXT,
    image_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_products_run ON products(run_id);
CREATE INDEX IF NOT EXISTS idx_products_url ON products(url);
"#;

/// Exports records into a SQLite database
pub struct SqliteExporter {
    conn: Connection,
    config_hash: String,
}

impl SqliteExporter {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration that produced the crawl
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::with_connection(conn, config_hash)
    }

    /// Creates an in-memory database (for testing)
    pub fn open_in_memory(config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> OutputResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            config_hash: config_hash.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordExporter for SqliteExporter {
    fn export(&mut self, report: &CrawlReport) -> OutputResult<usize> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (started_at, finished_at, config_hash, termination, clean, pages_crawled, record_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                self.config_hash,
                report.termination.to_string(),
                report.termination.is_clean(),
                report.pages_crawled,
                report.record_count() as i64,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (run_id, page_index, position, title, url, price, image, manufacturer, details, detail_error, image_error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;

            for record in &report.records {
                stmt.execute(params![
                    run_id,
                    record.page_index,
                    record.position as i64,
                    record.title,
                    record.url,
                    record.price,
                    record.image_column(),
                    record.manufacturer(),
                    record.details(),
                    record.detail_failure().map(|e| e.to_string()),
                    record.image_failure().map(|e| e.to_string()),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Exported run {} with {} products",
            run_id,
            report.record_count()
        );
        Ok(report.record_count())
    }
}
