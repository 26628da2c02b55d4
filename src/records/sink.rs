//! Ordered accumulation of product records

use crate::records::ProductRecord;
use std::collections::HashSet;

/// How the sink treats a record whose URL was already appended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Every appended record is kept
    #[default]
    KeepAll,

    /// Only the first record seen for a URL is kept
    FirstByUrl,
}

/// Accumulates product records in insertion order
///
/// The orchestrator appends in (page, listing position) order, so the
/// exported sequence follows that order as well.
#[derive(Debug, Default)]
pub struct RecordSink {
    records: Vec<ProductRecord>,
    seen: HashSet<String>,
    policy: DedupPolicy,
    duplicates_dropped: usize,
}

impl RecordSink {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Appends a record
    ///
    /// Returns false when the record was dropped as a duplicate.
    pub fn append(&mut self, record: ProductRecord) -> bool {
        if self.policy == DedupPolicy::FirstByUrl && !self.seen.insert(record.url.clone()) {
            tracing::debug!("Dropping duplicate record for {}", record.url);
            self.duplicates_dropped += 1;
            return false;
        }

        self.records.push(record);
        true
    }

    /// The records appended so far, in insertion order
    pub fn export(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }
}
