//! Record model for harvested products
//!
//! # Components
//!
//! - `PartialRecord`: what a listing page says about an item
//! - `SecondaryAttributes`: what the item's detail page adds
//! - `ProductRecord`: the merged row, carrying typed failure markers
//! - `RecordSink`: ordered accumulation of product rows

mod model;
mod sink;

pub use model::{
    DetailOutcome, ImageOutcome, ImageReference, PartialRecord, ProductRecord,
    SecondaryAttributes, COLUMNS, UNAVAILABLE, UNKNOWN,
};
pub use sink::{DedupPolicy, RecordSink};
