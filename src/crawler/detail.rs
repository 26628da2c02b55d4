//! Detail stage
//!
//! Fans a page's detail URLs out as one task per URL and collects the results
//! keyed by URL.
//!
//! # Concurrency
//!
//! - At most `concurrency_limit` fetches are in flight; a finished task makes
//!   room for the next pending URL
//! - Each URL gets its own task, so each key is written at most once
//! - A failed or panicked fetch only affects its own URL
//! - Completion order is arbitrary, callers join on the key

use crate::crawler::{FetchError, PageFetcher};
use crate::records::SecondaryAttributes;
use crate::schema::ExtractionSchema;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Per-URL outcome of a detail batch
pub type DetailResults = HashMap<String, Result<SecondaryAttributes, FetchError>>;

type DetailTaskOutput = (String, Result<SecondaryAttributes, FetchError>);

/// Fetches and extracts detail pages under bounded concurrency
pub struct DetailStage {
    fetcher: Arc<dyn PageFetcher>,
    schema: Arc<dyn ExtractionSchema>,
    timeout: Duration,
}

impl DetailStage {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        schema: Arc<dyn ExtractionSchema>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            schema,
            timeout,
        }
    }

    /// Fetches every URL in `urls` with at most `concurrency_limit` in flight
    ///
    /// Duplicate URLs are fetched once. A task that panics loses only its own
    /// URL, which is then absent from the returned map.
    pub async fn fetch_details<I>(&self, urls: I, concurrency_limit: usize) -> DetailResults
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let pending: Vec<String> = urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if pending.is_empty() {
            return HashMap::new();
        }

        let total = pending.len();
        let in_flight_limit = concurrency_limit.clamp(1, total);
        tracing::debug!(
            "Fetching {} detail pages, {} at a time",
            total,
            in_flight_limit
        );

        let mut pending = pending.into_iter();
        let mut tasks = JoinSet::new();
        let mut results = HashMap::with_capacity(total);

        for url in pending.by_ref().take(in_flight_limit) {
            self.spawn_fetch(&mut tasks, url);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, outcome)) => {
                    if let Err(e) = &outcome {
                        tracing::warn!("Detail fetch failed: {}", e);
                    }
                    results.insert(url, outcome);
                }
                Err(e) => tracing::error!("Detail fetch task terminated abnormally: {}", e),
            }

            if let Some(url) = pending.next() {
                self.spawn_fetch(&mut tasks, url);
            }
        }

        results
    }

    fn spawn_fetch(&self, tasks: &mut JoinSet<DetailTaskOutput>, url: String) {
        let fetcher = Arc::clone(&self.fetcher);
        let schema = Arc::clone(&self.schema);
        let timeout = self.timeout;

        tasks.spawn(async move {
            let outcome = match fetcher.fetch(&url, timeout).await {
                Ok(raw) => Ok(schema.parse_detail(&raw.text())),
                Err(e) => Err(e),
            };
            (url, outcome)
        });
    }
}
