//! Product record definitions
//!
//! A product row is assembled from three independently resolved parts: the
//! listing entry, the detail page attributes and the image. Each part that
//! could not be resolved keeps its failure so callers can inspect it.
use crate::crawler::{FetchError, ImageError};

/// Marker rendered for attributes that could not be recovered
pub const UNKNOWN: &str = "unknown";

/// Marker rendered for images that could not be retrieved
pub const UNAVAILABLE: &str = "unavailable";

/// Column names of the exported table, in order
pub const COLUMNS: [&str; 6] = ["title", "url", "price", "image", "manufacturer", "details"];

/// Lightweight item data taken from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRecord {
    pub title: String,

    /// Absolute detail page URL, the identity of the item
    pub url: String,

    pub price: String,

    /// Image URL as advertised on the listing page
    pub image_source_url: Option<String>,

    /// 1-based index of the listing page the item was found on
    pub page_index: u32,

    /// 0-based position of the item within its listing page
    pub position: usize,
}

/// Attributes recovered from an item's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryAttributes {
    pub manufacturer: Option<String>,
    pub detail_text: Option<String>,
}

/// Where a fetched image was persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub stored_location: String,
}

/// Resolution of an item's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Resolved(SecondaryAttributes),
    Failed(FetchError),
    /// No result was produced for the URL (its worker never reported back)
    Missing,
}

/// Resolution of an item's image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Image bytes were fetched and stored
    Stored(ImageReference),
    /// Image fetching is disabled; the advertised URL is carried through
    Remote(String),
    /// The listing entry advertised no image
    Missing,
    Failed(ImageError),
}

/// A fully assembled product row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub title: String,
    pub url: String,
    pub price: String,
    pub page_index: u32,
    pub position: usize,
    pub detail: DetailOutcome,
    pub image: ImageOutcome,
}

impl ProductRecord {
    /// Joins a listing entry with its resolved detail and image
    pub fn merge(partial: PartialRecord, detail: DetailOutcome, image: ImageOutcome) -> Self {
        Self {
            title: partial.title,
            url: partial.url,
            price: partial.price,
            page_index: partial.page_index,
            position: partial.position,
            detail,
            image,
        }
    }

    /// Secondary attributes, if the detail page was resolved
    pub fn attributes(&self) -> Option<&SecondaryAttributes> {
        match &self.detail {
            DetailOutcome::Resolved(attributes) => Some(attributes),
            _ => None,
        }
    }

    pub fn manufacturer(&self) -> &str {
        self.attributes()
            .and_then(|a| a.manufacturer.as_deref())
            .unwrap_or(UNKNOWN)
    }

    pub fn details(&self) -> &str {
        self.attributes()
            .and_then(|a| a.detail_text.as_deref())
            .unwrap_or(UNKNOWN)
    }

    /// The value of the `image` column
    pub fn image_column(&self) -> &str {
        match &self.image {
            ImageOutcome::Stored(reference) => &reference.stored_location,
            ImageOutcome::Remote(url) => url,
            ImageOutcome::Missing | ImageOutcome::Failed(_) => UNAVAILABLE,
        }
    }

    pub fn detail_failure(&self) -> Option<&FetchError> {
        match &self.detail {
            DetailOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn image_failure(&self) -> Option<&ImageError> {
        match &self.image {
            ImageOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Renders the record as a table row matching [`COLUMNS`]
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.title.as_str(),
            self.url.as_str(),
            self.price.as_str(),
            self.image_column(),
            self.manufacturer(),
            self.details(),
        ]
    }
}
