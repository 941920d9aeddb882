//! Injectable diagnostics for the listing extractor

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::extract::SkipReason;
use crate::search::Listing;

/// Receives counts and rejections while a page is processed
///
/// All methods default to no-ops so sinks only implement what they record.
pub trait DiagnosticSink {
    /// A locator stage matched `count` elements (before dedup)
    fn stage_matched(&mut self, _stage: &str, _count: usize) {}

    /// The locator produced `count` unique candidates
    fn candidates_located(&mut self, _count: usize) {}

    fn candidate_skipped(&mut self, _reason: &SkipReason) {}

    fn listing_extracted(&mut self, _listing: &Listing) {}
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {}

/// Forwards diagnostics to the process log
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn stage_matched(&mut self, stage: &str, count: usize) {
        if count > 0 {
            info!(stage, count, "locator stage matched");
        }
    }

    fn candidates_located(&mut self, count: usize) {
        info!(count, "unique candidates located");
    }

    fn candidate_skipped(&mut self, reason: &SkipReason) {
        debug!(kind = reason.kind(), "candidate skipped: {}", reason);
    }

    fn listing_extracted(&mut self, listing: &Listing) {
        debug!(id = %listing.id, price = listing.price, "extracted: {}", listing.title);
    }
}

/// Tallies diagnostics in memory
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StageCounts {
    /// Matches per locator stage, in the order the stages ran
    pub stages: Vec<(String, usize)>,
    pub located: usize,
    /// Skips per reason kind
    pub skipped: BTreeMap<&'static str, usize>,
    pub extracted: usize,
}

impl StageCounts {
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, kind: &str) -> usize {
        self.skipped.get(kind).copied().unwrap_or(0)
    }
}

impl DiagnosticSink for StageCounts {
    fn stage_matched(&mut self, stage: &str, count: usize) {
        self.stages.push((stage.to_string(), count));
    }

    fn candidates_located(&mut self, count: usize) {
        self.located += count;
    }

    fn candidate_skipped(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.kind()).or_insert(0) += 1;
    }

    fn listing_extracted(&mut self, _listing: &Listing) {
        self.extracted += 1;
    }
}

/// Sends every event to two sinks
pub struct Tee<'a, A: DiagnosticSink + ?Sized, B: DiagnosticSink + ?Sized> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A: DiagnosticSink + ?Sized, B: DiagnosticSink + ?Sized> DiagnosticSink for Tee<'_, A, B> {
    fn stage_matched(&mut self, stage: &str, count: usize) {
        self.first.stage_matched(stage, count);
        self.second.stage_matched(stage, count);
    }

    fn candidates_located(&mut self, count: usize) {
        self.first.candidates_located(count);
        self.second.candidates_located(count);
    }

    fn candidate_skipped(&mut self, reason: &SkipReason) {
        self.first.candidate_skipped(reason);
        self.second.candidate_skipped(reason);
    }

    fn listing_extracted(&mut self, listing: &Listing) {
        self.first.listing_extracted(listing);
        self.second.listing_extracted(listing);
    }
}
