//! Listing extraction from search-result markup
//!
//! Page → candidates ([`locate`]) → sold filter ([`sold`]) → title →
//! relevance ([`relevance`]) → price → link → optional fields ([`fields`]).
//! Each candidate yields a [`CandidateOutcome`]; a bad candidate never stops
//! the rest of the page from being processed.

pub mod fields;
pub mod locate;
pub mod matcher;
pub mod relevance;
pub mod sold;

use scraper::{ElementRef, Html};
use thiserror::Error;

use crate::config::Marketplace;
use crate::diagnostics::DiagnosticSink;
use crate::search::Listing;

pub use sold::SoldSignal;

use fields::PriceSource;
use sold::SoldDetector;

/// Why a candidate produced no listing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("sold ({0})")]
    Sold(SoldSignal),

    #[error("no title found")]
    MissingTitle,

    #[error("not relevant: {0}")]
    Irrelevant(String),

    #[error("no price found")]
    MissingPrice,

    #[error("unparseable price '{0}'")]
    UnparseablePrice(String),

    #[error("no link found")]
    MissingLink,
}

impl SkipReason {
    /// Stable short label used for counting
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Sold(_) => "sold",
            SkipReason::MissingTitle => "missing_title",
            SkipReason::Irrelevant(_) => "irrelevant",
            SkipReason::MissingPrice => "missing_price",
            SkipReason::UnparseablePrice(_) => "unparseable_price",
            SkipReason::MissingLink => "missing_link",
        }
    }
}

/// Result of processing one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Extracted(Listing),
    Skipped(SkipReason),
}

/// Turns result pages into listings for one marketplace profile
#[derive(Debug, Clone)]
pub struct Extractor {
    origin: String,
    relevance_threshold: f64,
    sold: SoldDetector,
}

impl Extractor {
    pub fn new(marketplace: &Marketplace) -> Self {
        Self {
            origin: marketplace.origin.clone(),
            relevance_threshold: marketplace.relevance_threshold,
            sold: SoldDetector::new(marketplace),
        }
    }

    /// Every candidate outcome on the page, in candidate order
    pub fn process_page(
        &self,
        html: &str,
        search_term: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<CandidateOutcome> {
        let document = Html::parse_document(html);
        let candidates = locate::locate_candidates(&document, sink);

        candidates
            .into_iter()
            .map(|candidate| {
                let outcome = self.process_candidate(candidate, search_term);
                match &outcome {
                    CandidateOutcome::Extracted(listing) => sink.listing_extracted(listing),
                    CandidateOutcome::Skipped(reason) => sink.candidate_skipped(reason),
                }
                outcome
            })
            .collect()
    }

    /// Listings extracted from the page, in candidate order
    pub fn extract_listings(
        &self,
        html: &str,
        search_term: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Vec<Listing> {
        self.process_page(html, search_term, sink)
            .into_iter()
            .filter_map(|outcome| match outcome {
                CandidateOutcome::Extracted(listing) => Some(listing),
                CandidateOutcome::Skipped(_) => None,
            })
            .collect()
    }

    /// Run the full filter and extraction chain on one candidate
    pub fn process_candidate(&self, candidate: ElementRef<'_>, search_term: &str) -> CandidateOutcome {
        match self.try_extract(candidate, search_term) {
            Ok(listing) => CandidateOutcome::Extracted(listing),
            Err(reason) => CandidateOutcome::Skipped(reason),
        }
    }

    fn try_extract(
        &self,
        candidate: ElementRef<'_>,
        search_term: &str,
    ) -> std::result::Result<Listing, SkipReason> {
        if let Some(signal) = self.sold.check_candidate(candidate) {
            return Err(SkipReason::Sold(signal));
        }

        let title = fields::extract_title(candidate).ok_or(SkipReason::MissingTitle)?;
        if self.sold.title_says_sold(&title) {
            return Err(SkipReason::Sold(SoldSignal::Title));
        }

        if !relevance::is_relevant(&title, search_term, self.relevance_threshold) {
            return Err(SkipReason::Irrelevant(title));
        }

        let source = fields::find_price(candidate).ok_or(SkipReason::MissingPrice)?;
        if let PriceSource::Element(element) = &source {
            if self.sold.price_badge_says_sold(*element) {
                return Err(SkipReason::Sold(SoldSignal::PriceBadge));
            }
        }
        let raw_price = source.raw_text();
        let price = fields::parse_price(&raw_price).ok_or(SkipReason::UnparseablePrice(raw_price))?;

        let href = fields::extract_href(candidate).ok_or(SkipReason::MissingLink)?;
        let link = fields::absolutize_url(href, &self.origin);

        Ok(Listing {
            id: fields::extract_id(&link),
            title,
            price,
            image: fields::extract_image(candidate),
            location: fields::extract_location(candidate),
            link,
        })
    }
}

/// Extract listings from one page with the given marketplace profile
pub fn extract_listings(
    html: &str,
    search_term: &str,
    marketplace: &Marketplace,
    sink: &mut dyn DiagnosticSink,
) -> Vec<Listing> {
    Extractor::new(marketplace).extract_listings(html, search_term, sink)
}
