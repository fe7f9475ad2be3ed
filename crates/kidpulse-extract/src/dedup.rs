//! Suppression of repeated observations of the same event.
//!
//! Identity is the event kind plus its timestamp (nap start for naps).
//! Attendance timestamps carry their date, so sign-ins on different days
//! never collide. The first record seen for a key wins.

use std::collections::HashSet;

use kidpulse_core::{ChildSummary, EventRecord, IdentityKey};

pub fn is_duplicate(candidate: &EventRecord, existing: &[EventRecord]) -> bool {
    let key = candidate.identity_key();
    existing.iter().any(|e| e.identity_key() == key)
}

/// Running set of identity keys for one child in one scrape.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<IdentityKey>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every record already held by a summary.
    pub fn from_summary(summary: &ChildSummary) -> Self {
        Self {
            seen: summary.records().iter().map(EventRecord::identity_key).collect(),
        }
    }

    /// Record the candidate's key. Returns `false` if it was already present.
    pub fn admit(&mut self, candidate: &EventRecord) -> bool {
        self.seen.insert(candidate.identity_key())
    }

    pub fn contains(&self, candidate: &EventRecord) -> bool {
        self.seen.contains(&candidate.identity_key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
