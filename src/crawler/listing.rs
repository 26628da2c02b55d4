//! Listing stage
//!
//! Fetches one listing page and turns it into partial records. A page with no
//! item entries is the pagination terminal signal; a fetch failure is returned
//! to the orchestrator, which stops the crawl.

use crate::config::PAGE_PLACEHOLDER;
use crate::crawler::{FetchError, PageFetcher};
use crate::records::PartialRecord;
use crate::schema::ExtractionSchema;
use crate::ConfigError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maps page numbers to listing page URLs
#[derive(Debug, Clone)]
pub struct Pagination {
    base_url: Url,
    listing_template: String,
}

impl Pagination {
    /// # Arguments
    ///
    /// * `base_url` - URL that relative item links are resolved against
    /// * `listing_template` - Listing URL containing a `{page}` placeholder
    pub fn new(base_url: &str, listing_template: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

        if !listing_template.contains(PAGE_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "listing_template must contain '{}'",
                PAGE_PLACEHOLDER
            )));
        }

        Ok(Self {
            base_url,
            listing_template: listing_template.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the listing page with the given 1-based index
    pub fn page_url(&self, page_index: u32) -> String {
        self.listing_template
            .replace(PAGE_PLACEHOLDER, &page_index.to_string())
    }
}

/// The outcome of listing one page
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub page_index: u32,

    /// Well-formed entries, in page order
    pub records: Vec<PartialRecord>,

    /// Entries skipped because they could not be keyed
    pub malformed: usize,

    /// True when the page carried no item entries at all
    pub is_empty: bool,
}

impl ListingPage {
    /// Detail URLs of the page's records, in page order
    pub fn detail_urls(&self) -> Vec<String> {
        self.records.iter().map(|r| r.url.clone()).collect()
    }
}

/// Fetches and extracts listing pages
pub struct ListingStage {
    fetcher: Arc<dyn PageFetcher>,
    schema: Arc<dyn ExtractionSchema>,
    pagination: Pagination,
    timeout: Duration,
}

impl ListingStage {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        schema: Arc<dyn ExtractionSchema>,
        pagination: Pagination,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            schema,
            pagination,
            timeout,
        }
    }

    /// Lists the page with the given index
    ///
    /// # Returns
    ///
    /// * `Ok(ListingPage)` - The page was fetched; `is_empty` tells whether it had items
    /// * `Err(FetchError)` - The page could not be fetched
    pub async fn list_page(&self, page_index: u32) -> Result<ListingPage, FetchError> {
        let url = self.pagination.page_url(page_index);
        tracing::debug!("Fetching listing page {}: {}", page_index, url);

        let raw = self.fetcher.fetch(&url, self.timeout).await?;
        let entries = self
            .schema
            .parse_listing(&raw.text(), self.pagination.base_url(), page_index);

        let is_empty = entries.is_empty();
        let mut records = Vec::with_capacity(entries.len());
        let mut malformed = 0;

        for entry in entries {
            match entry {
                Ok(record) => records.push(record),
                Err(e) => {
                    malformed += 1;
                    tracing::warn!("Skipping malformed item on page {}: {}", page_index, e);
                }
            }
        }

        tracing::debug!(
            "Page {} listed {} items ({} malformed)",
            page_index,
            records.len(),
            malformed
        );

        Ok(ListingPage {
            page_index,
            records,
            malformed,
            is_empty,
        })
    }
}
