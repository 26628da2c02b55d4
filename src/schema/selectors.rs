//! CSS selector based extraction schema
//!
//! The selectors are read from the `[schema]` configuration section. The
//! defaults match the classifieds listing layout the harvester was written
//! for: one `div.search-title-row` per item, the detail link on its first
//! anchor, the image URL in the lazily-loaded `data-original` attribute.

use crate::config::SchemaConfig;
use crate::records::{PartialRecord, SecondaryAttributes, UNKNOWN};
use crate::schema::{ExtractionSchema, ParseError};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extraction schema driven by CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorSchema {
    item: Selector,
    title: Selector,
    link: Selector,
    price: Selector,
    image: Selector,
    image_attribute: String,
    manufacturer: Selector,
    details: Selector,
}

impl SelectorSchema {
    /// Compiles the selectors of a schema configuration
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorSchema)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector is not valid CSS
    pub fn from_config(config: &SchemaConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile("listing-item", &config.listing_item)?,
            title: compile("title", &config.title)?,
            link: compile("link", &config.link)?,
            price: compile("price", &config.price)?,
            image: compile("image", &config.image)?,
            image_attribute: config.image_attribute.clone(),
            manufacturer: compile("manufacturer", &config.manufacturer)?,
            details: compile("details", &config.details)?,
        })
    }

    fn parse_item(
        &self,
        item: ElementRef<'_>,
        base_url: &Url,
        page_index: u32,
        position: usize,
    ) -> Result<PartialRecord, ParseError> {
        let href = item
            .select(&self.link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .ok_or(ParseError::MissingLink { position })?;

        let url = resolve_link(href, base_url).ok_or_else(|| ParseError::UnresolvableLink {
            position,
            href: href.to_string(),
        })?;

        let image_source_url = item
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr(&self.image_attribute))
            .and_then(|src| resolve_link(src, base_url));

        Ok(PartialRecord {
            title: first_text(item, &self.title).unwrap_or_else(|| UNKNOWN.to_string()),
            url,
            price: first_text(item, &self.price).unwrap_or_else(|| UNKNOWN.to_string()),
            image_source_url,
            page_index,
            position,
        })
    }
}

impl Default for SelectorSchema {
    fn default() -> Self {
        // The built-in selectors are known to compile
        Self::from_config(&SchemaConfig::default())
            .unwrap_or_else(|e| panic!("default schema selectors are invalid: {}", e))
    }
}

impl ExtractionSchema for SelectorSchema {
    fn parse_listing(
        &self,
        raw: &str,
        base_url: &Url,
        page_index: u32,
    ) -> Vec<Result<PartialRecord, ParseError>> {
        let document = Html::parse_document(raw);

        document
            .select(&self.item)
            .enumerate()
            .map(|(position, item)| self.parse_item(item, base_url, page_index, position))
            .collect()
    }

    fn parse_detail(&self, raw: &str) -> SecondaryAttributes {
        let document = Html::parse_document(raw);
        let root = document.root_element();

        let manufacturer = first_text(root, &self.manufacturer);

        // Each text node on its own line, blank nodes dropped
        let detail_text = root.select(&self.details).next().and_then(|element| {
            let lines: Vec<&str> = element
                .text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        });

        SecondaryAttributes {
            manufacturer,
            detail_text,
        }
    }
}

fn compile(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, css, e)))
}

/// Text of the first element matching `selector`, whitespace collapsed
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link cannot identify a fetchable page or image:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: URIs
/// - hrefs that do not resolve against `base_url`
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
