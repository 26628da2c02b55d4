//! Extraction schemas
//!
//! An extraction schema maps raw page content to structured fields. The crawl
//! pipeline only depends on the [`ExtractionSchema`] trait; which markup holds
//! which attribute is entirely the schema's business.
//!
//! Schemas are total: a missing field becomes an "unknown" marker or `None`,
//! never an error. The one exception is a listing entry without a usable
//! detail link, which cannot be keyed and is reported as a [`ParseError`].

mod selectors;

pub use selectors::{resolve_link, SelectorSchema};

use crate::records::{PartialRecord, SecondaryAttributes};
use thiserror::Error;
use url::Url;

/// A listing entry that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("item {position} has no detail link")]
    MissingLink { position: usize },

    #[error("item {position} has an unusable detail link '{href}'")]
    UnresolvableLink { position: usize, href: String },
}

/// Maps raw listing and detail content to structured records
pub trait ExtractionSchema: Send + Sync {
    /// Extracts the entries of a listing page, in page order
    ///
    /// Every item entry found on the page yields exactly one element, so an
    /// empty result means the page had no items at all.
    fn parse_listing(
        &self,
        raw: &str,
        base_url: &Url,
        page_index: u32,
    ) -> Vec<Result<PartialRecord, ParseError>>;

    /// Extracts the secondary attributes of a detail page
    fn parse_detail(&self, raw: &str) -> SecondaryAttributes;
}
