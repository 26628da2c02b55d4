//! Crawl orchestrator - main harvest loop
//!
//! The orchestrator walks listing pages strictly in sequence. For every
//! non-empty page it:
//! - fans the page's detail URLs out to the detail stage
//! - fetches each item's image, if image retrieval is enabled
//! - joins everything back onto the listing entries by URL
//! - appends the merged records to the sink in listing order
//!
//! The crawl stops on an empty page, when the page limit is passed, or when a
//! listing page cannot be fetched. Records collected before the stop are
//! always returned.

use crate::crawler::detail::{DetailResults, DetailStage};
use crate::crawler::image::{ImageStage, ImageStore};
use crate::crawler::listing::{ListingPage, ListingStage, Pagination};
use crate::crawler::{FetchError, FetcherFactory, PageFetcher};
use crate::records::{
    DedupPolicy, DetailOutcome, ImageOutcome, PartialRecord, ProductRecord, RecordSink,
};
use crate::schema::ExtractionSchema;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Tunables of a crawl that do not change between runs
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Pause before every listing page after the first
    pub page_delay: Duration,

    /// Timeout applied to every fetch
    pub request_timeout: Duration,

    /// Replace the fetcher after this many listing pages
    pub recycle_client_every: Option<u32>,

    pub dedup: DedupPolicy,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            recycle_client_every: None,
            dedup: DedupPolicy::KeepAll,
        }
    }
}

/// Pagination progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlState {
    /// Next listing page to visit, starting at 1
    pub page_index: u32,

    /// Last page to visit; None means unbounded
    pub page_limit: Option<u32>,

    pub terminated: bool,
}

impl CrawlState {
    pub fn new(page_limit: Option<u32>) -> Self {
        Self {
            page_index: 1,
            page_limit,
            terminated: false,
        }
    }

    /// True once the next page lies beyond the page limit
    pub fn limit_reached(&self) -> bool {
        matches!(self.page_limit, Some(limit) if self.page_index > limit)
    }
}

/// Why a crawl ended cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The listing page carried no items
    EmptyPage { page_index: u32 },

    /// Every page up to the limit was visited
    PageLimitReached { limit: u32 },
}

/// Coarse classification of a termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    Clean,
    Error,
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Clean(StopReason),

    /// A listing page could not be fetched
    ListingFailed { page_index: u32, error: FetchError },

    /// A replacement fetcher could not be built
    ClientRecycleFailed { page_index: u32, reason: String },
}

impl Termination {
    pub fn kind(&self) -> TerminationKind {
        match self {
            Self::Clean(_) => TerminationKind::Clean,
            Self::ListingFailed { .. } | Self::ClientRecycleFailed { .. } => {
                TerminationKind::Error
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.kind() == TerminationKind::Clean
    }

    /// Process exit code for this termination
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            TerminationKind::Clean => 0,
            TerminationKind::Error => 2,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean(StopReason::EmptyPage { page_index }) => {
                write!(f, "clean: page {} had no items", page_index)
            }
            Self::Clean(StopReason::PageLimitReached { limit }) => {
                write!(f, "clean: page limit {} reached", limit)
            }
            Self::ListingFailed { page_index, error } => {
                write!(f, "error: listing page {} failed: {}", page_index, error)
            }
            Self::ClientRecycleFailed { page_index, reason } => write!(
                f,
                "error: could not rebuild HTTP client before page {}: {}",
                page_index, reason
            ),
        }
    }
}

/// The result of a crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Records in (page, listing position) order
    pub records: Vec<ProductRecord>,

    pub termination: Termination,

    /// Listing pages that produced records
    pub pages_crawled: u32,

    /// Listing entries skipped because they could not be keyed
    pub malformed_items: usize,

    pub duplicates_dropped: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Drives the listing, detail and image stages
pub struct Orchestrator {
    factory: Box<dyn FetcherFactory>,
    fetcher: Arc<dyn PageFetcher>,
    schema: Arc<dyn ExtractionSchema>,
    image_store: Option<Arc<dyn ImageStore>>,
    pagination: Pagination,
    settings: CrawlSettings,
}

impl Orchestrator {
    /// Creates an orchestrator, building its first fetcher from `factory`
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(HarvestError)` - The factory could not build a fetcher
    pub fn new(
        factory: Box<dyn FetcherFactory>,
        schema: Arc<dyn ExtractionSchema>,
        pagination: Pagination,
        settings: CrawlSettings,
    ) -> Result<Self, HarvestError> {
        let fetcher = factory.create()?;

        Ok(Self {
            factory,
            fetcher,
            schema,
            image_store: None,
            pagination,
            settings,
        })
    }

    /// Enables the image stage, persisting images through `store`
    pub fn with_image_store(mut self, store: Arc<dyn ImageStore>) -> Self {
        self.image_store = Some(store);
        self
    }

    /// Runs a crawl
    ///
    /// # Arguments
    ///
    /// * `page_limit` - Last listing page to visit; None walks until an empty page
    /// * `concurrency_limit` - Detail pages fetched at once within a page
    ///
    /// # Returns
    ///
    /// A report holding every record assembled before the crawl stopped and
    /// the reason it stopped. Crawl failures never surface as errors here.
    pub async fn run(&mut self, page_limit: Option<u32>, concurrency_limit: usize) -> CrawlReport {
        let started_at = Utc::now();
        let mut state = CrawlState::new(page_limit);
        let mut sink = RecordSink::new(self.settings.dedup);
        let mut pages_crawled = 0u32;
        let mut malformed_items = 0usize;

        tracing::info!(
            "Starting harvest (page limit: {}, detail workers: {})",
            page_limit.map_or_else(|| "none".to_string(), |l| l.to_string()),
            concurrency_limit
        );

        let termination = loop {
            if let Some(limit) = state.page_limit.filter(|_| state.limit_reached()) {
                tracing::info!("Reached max page limit: {}", limit);
                break Termination::Clean(StopReason::PageLimitReached { limit });
            }

            if state.page_index > 1 {
                if let Err(reason) = self.recycle_client_if_due(pages_crawled) {
                    tracing::error!("Failed to rebuild HTTP client: {}", reason);
                    break Termination::ClientRecycleFailed {
                        page_index: state.page_index,
                        reason,
                    };
                }

                if !self.settings.page_delay.is_zero() {
                    tokio::time::sleep(self.settings.page_delay).await;
                }
            }

            tracing::info!("Scraping page {}...", state.page_index);

            let listing = match self.listing_stage().list_page(state.page_index).await {
                Ok(listing) => listing,
                Err(error) => {
                    tracing::error!("Failed to fetch page {}: {}", state.page_index, error);
                    break Termination::ListingFailed {
                        page_index: state.page_index,
                        error,
                    };
                }
            };

            if listing.is_empty {
                tracing::info!("No more products found on page {}", state.page_index);
                break Termination::Clean(StopReason::EmptyPage {
                    page_index: state.page_index,
                });
            }

            malformed_items += listing.malformed;
            let appended = self
                .harvest_page(listing, concurrency_limit, &mut sink)
                .await;
            tracing::info!(
                "Page {} done: {} records ({} total)",
                state.page_index,
                appended,
                sink.len()
            );

            pages_crawled += 1;
            state.page_index += 1;
        };

        state.terminated = true;
        tracing::info!(
            "Harvest finished after {} pages with {} records ({})",
            pages_crawled,
            sink.len(),
            termination
        );

        CrawlReport {
            duplicates_dropped: sink.duplicates_dropped(),
            records: sink.into_records(),
            termination,
            pages_crawled,
            malformed_items,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Runs the detail and image stages for a listed page and appends the
    /// merged records, returning how many were appended
    async fn harvest_page(
        &self,
        listing: ListingPage,
        concurrency_limit: usize,
        sink: &mut RecordSink,
    ) -> usize {
        let details = self
            .detail_stage()
            .fetch_details(listing.detail_urls(), concurrency_limit)
            .await;

        let image_stage = self.image_stage();
        let mut appended = 0;

        for partial in listing.records {
            let detail = detail_outcome(&details, &partial.url);
            let image = resolve_image(image_stage.as_ref(), &partial).await;

            if sink.append(ProductRecord::merge(partial, detail, image)) {
                appended += 1;
            }
        }

        appended
    }

    /// Replaces the fetcher when the recycling threshold is hit
    fn recycle_client_if_due(&mut self, pages_crawled: u32) -> Result<(), String> {
        let Some(every) = self.settings.recycle_client_every else {
            return Ok(());
        };

        if pages_crawled == 0 || pages_crawled % every != 0 {
            return Ok(());
        }

        tracing::info!("Recycling HTTP client after {} pages", pages_crawled);
        self.fetcher = self.factory.create().map_err(|e| e.to_string())?;
        Ok(())
    }

    fn listing_stage(&self) -> ListingStage {
        ListingStage::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.schema),
            self.pagination.clone(),
            self.settings.request_timeout,
        )
    }

    fn detail_stage(&self) -> DetailStage {
        DetailStage::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.schema),
            self.settings.request_timeout,
        )
    }

    fn image_stage(&self) -> Option<ImageStage> {
        self.image_store.as_ref().map(|store| {
            ImageStage::new(
                Arc::clone(&self.fetcher),
                Arc::clone(store),
                self.settings.request_timeout,
            )
        })
    }
}

/// Looks up the detail result for `url`
fn detail_outcome(details: &DetailResults, url: &str) -> DetailOutcome {
    match details.get(url) {
        Some(Ok(attributes)) => DetailOutcome::Resolved(attributes.clone()),
        Some(Err(error)) => DetailOutcome::Failed(error.clone()),
        None => DetailOutcome::Missing,
    }
}

async fn resolve_image(stage: Option<&ImageStage>, partial: &PartialRecord) -> ImageOutcome {
    let Some(source) = partial.image_source_url.as_deref() else {
        return ImageOutcome::Missing;
    };

    let Some(stage) = stage else {
        return ImageOutcome::Remote(source.to_string());
    };

    match stage.fetch_image(source).await {
        Ok(reference) => ImageOutcome::Stored(reference),
        Err(e) => {
            tracing::warn!("Image unavailable for {}: {}", partial.url, e);
            ImageOutcome::Failed(e)
        }
    }
}
