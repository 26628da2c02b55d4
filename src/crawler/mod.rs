//! Crawler module for harvesting a paginated catalogue
//!
//! This module contains the crawl pipeline:
//! - HTTP fetching with explicit timeouts
//! - Listing pages → partial records
//! - Detail pages fetched under a bounded worker pool
//! - Optional image retrieval
//! - Orchestration of the page loop and the keyed join

mod detail;
mod fetcher;
mod image;
mod listing;
mod orchestrator;

#[cfg(test)]
mod test_support;

pub use detail::{DetailResults, DetailStage};
pub use fetcher::{
    build_http_client, FetchError, FetcherFactory, HttpFetcher, HttpFetcherFactory, PageFetcher,
    RawContent,
};
pub use image::{DirectoryImageStore, ImageError, ImageStage, ImageStore};
pub use listing::{ListingPage, ListingStage, Pagination};
pub use orchestrator::{
    CrawlReport, CrawlSettings, CrawlState, Orchestrator, StopReason, Termination,
    TerminationKind,
};

use crate::config::Config;
use crate::records::DedupPolicy;
use crate::schema::SelectorSchema;
use crate::HarvestError;
use std::sync::Arc;

impl From<&Config> for CrawlSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_delay: config.crawler.page_delay(),
            request_timeout: config.crawler.request_timeout(),
            recycle_client_every: config.crawler.recycle_client_every,
            dedup: if config.crawler.dedupe_by_url {
                DedupPolicy::FirstByUrl
            } else {
                DedupPolicy::KeepAll
            },
        }
    }
}

/// Builds an orchestrator wired with the HTTP fetcher, the selector schema
/// and, when enabled, the directory image store
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator, HarvestError> {
    let schema = SelectorSchema::from_config(&config.schema)?;
    let pagination = Pagination::new(&config.site.base_url, &config.site.listing_template)?;
    let factory = HttpFetcherFactory::new(config.user_agent.value.clone());

    let orchestrator = Orchestrator::new(
        Box::new(factory),
        Arc::new(schema),
        pagination,
        CrawlSettings::from(config),
    )?;

    if config.images.enabled {
        let store = DirectoryImageStore::new(&config.images.directory);
        return Ok(orchestrator.with_image_store(Arc::new(store)));
    }

    Ok(orchestrator)
}

/// Runs a complete harvest
///
/// This is the main entry point for a crawl. It will:
/// 1. Compile the extraction schema
/// 2. Build the HTTP client
/// 3. Walk listing pages until an empty page, the page limit, or a failure
/// 4. Return every assembled record with the termination reason
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `page_limit` - Last listing page to visit; None walks until an empty page
/// * `concurrency_limit` - Detail pages fetched at once within a page
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; see `termination` for how it ended
/// * `Err(HarvestError)` - The crawl could not be set up
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::load_config;
/// use sumi_harvest::crawler::run;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run(&config, Some(3), 8).await?;
/// println!("{} records, {}", report.record_count(), report.termination);
/// # Ok(())
/// # }
/// ```
pub async fn run(
    config: &Config,
    page_limit: Option<u32>,
    concurrency_limit: usize,
) -> Result<CrawlReport, HarvestError> {
    let mut orchestrator = build_orchestrator(config)?;
    Ok(orchestrator.run(page_limit, concurrency_limit).await)
}
