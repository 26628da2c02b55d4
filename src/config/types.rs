use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub images: ImageConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL that relative links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing page URL with a `{page}` placeholder for the page number
    #[serde(rename = "listing-template")]
    pub listing_template: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Last listing page to visit; unbounded when absent
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Number of detail page workers per listing page
    #[serde(rename = "detail-concurrency", default = "default_detail_concurrency")]
    pub detail_concurrency: u32,

    /// Pause between listing pages (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Timeout applied to every request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Rebuild the HTTP client after this many listing pages
    #[serde(rename = "recycle-client-every", default)]
    pub recycle_client_every: Option<u32>,

    /// Keep only the first record seen for each item URL
    #[serde(rename = "dedupe-by-url", default)]
    pub dedupe_by_url: bool,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Value sent in the User-Agent header
    pub value: String,
}

/// CSS selectors of the extraction schema
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// One match per item on a listing page
    #[serde(rename = "listing-item", default = "default_listing_item")]
    pub listing_item: String,

    #[serde(default = "default_title")]
    pub title: String,

    /// Anchor carrying the detail page link
    #[serde(default = "default_link")]
    pub link: String,

    #[serde(default = "default_price")]
    pub price: String,

    #[serde(default = "default_image")]
    pub image: String,

    /// Attribute of the image element holding its URL
    #[serde(rename = "image-attribute", default = "default_image_attribute")]
    pub image_attribute: String,

    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,

    #[serde(default = "default_details")]
    pub details: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            listing_item: default_listing_item(),
            title: default_title(),
            link: default_link(),
            price: default_price(),
            image: default_image(),
            image_attribute: default_image_attribute(),
            manufacturer: default_manufacturer(),
            details: default_details(),
        }
    }
}

/// Image retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Download item images instead of recording their URLs
    #[serde(default)]
    pub enabled: bool,

    /// Directory downloaded images are written to
    #[serde(default = "default_image_directory")]
    pub directory: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_image_directory(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the exported table
    pub path: String,

    #[serde(default)]
    pub format: OutputFormat,
}

/// Export format of the harvested table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

fn default_detail_concurrency() -> u32 {
    8
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_listing_item() -> String {
    "div.search-title-row".to_string()
}

fn default_title() -> String {
    "h3".to_string()
}

fn default_link() -> String {
    "a[href]".to_string()
}

fn default_price() -> String {
    "div.price-details".to_string()
}

fn default_image() -> String {
    "img.lazy.pic".to_string()
}

fn default_image_attribute() -> String {
    "data-original".to_string()
}

fn default_manufacturer() -> String {
    "h5.nomargin".to_string()
}

fn default_details() -> String {
    "div.primary-lang".to_string()
}

fn default_image_directory() -> String {
    "data/images".to_string()
}
