//! Sold/stale detection
//!
//! The sold marker shows up at different depths depending on the card
//! template, so every check runs and any hit rejects the candidate.

use once_cell::sync::Lazy;
use scraper::ElementRef;

use super::matcher::{element_text, ClassMatcher};
use crate::config::Marketplace;

static SOLD_BADGE: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("sold-badge", &["span"], r"item-sold-badge"));

static NOTICE: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("notice", &["article"], r"notice-module_notice"));

static NO_ITEM_AVAILABLE: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("no-item-available", &[], r"no-item-available"));

static PRICE_BADGE: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("price-badge", &[], r"(badge|item-sold)"));

/// Which indicator marked a listing as no longer available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoldSignal {
    /// Sold badge inside the card
    Badge,
    /// Deal-concluded notice inside the card
    Notice,
    /// "no item available" placeholder
    NoItemAvailable,
    /// Card text mentions both the sold word and a concluded deal
    Text,
    /// The title itself says sold
    Title,
    /// Badge nested in the price element says sold
    PriceBadge,
}

impl std::fmt::Display for SoldSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SoldSignal::Badge => "sold badge",
            SoldSignal::Notice => "deal concluded notice",
            SoldSignal::NoItemAvailable => "no item available",
            SoldSignal::Text => "sold text",
            SoldSignal::Title => "sold title",
            SoldSignal::PriceBadge => "sold price badge",
        };
        f.write_str(label)
    }
}

type CandidateCheck = fn(&SoldDetector, ElementRef<'_>) -> bool;

/// Candidate-level checks, run in order before any field is extracted
const CANDIDATE_CHECKS: &[(SoldSignal, CandidateCheck)] = &[
    (SoldSignal::Badge, SoldDetector::has_sold_badge),
    (SoldSignal::Notice, SoldDetector::has_concluded_notice),
    (SoldSignal::NoItemAvailable, SoldDetector::has_no_item_marker),
    (SoldSignal::Text, SoldDetector::text_says_sold),
];

/// Sold checks with the marketplace vocabulary lowercased once
#[derive(Debug, Clone)]
pub struct SoldDetector {
    sold_word: String,
    concluded_phrase: String,
    concluded_words: Vec<String>,
}

impl SoldDetector {
    pub fn new(marketplace: &Marketplace) -> Self {
        Self {
            sold_word: marketplace.sold_word.to_lowercase(),
            concluded_phrase: marketplace.deal_concluded_phrase.to_lowercase(),
            concluded_words: marketplace
                .deal_concluded_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        }
    }

    /// First candidate-level sold signal, if any
    pub fn check_candidate(&self, candidate: ElementRef<'_>) -> Option<SoldSignal> {
        CANDIDATE_CHECKS
            .iter()
            .find(|(_, check)| check(self, candidate))
            .map(|(signal, _)| *signal)
    }

    pub fn title_says_sold(&self, title: &str) -> bool {
        self.mentions_sold(title)
    }

    /// Badge nested in the matched price element
    pub fn price_badge_says_sold(&self, price_element: ElementRef<'_>) -> bool {
        PRICE_BADGE
            .find_in(price_element)
            .is_some_and(|badge| self.mentions_sold(&element_text(badge)))
    }

    fn has_sold_badge(&self, candidate: ElementRef<'_>) -> bool {
        SOLD_BADGE
            .find_in(candidate)
            .is_some_and(|badge| self.mentions_sold(&element_text(badge)))
    }

    fn has_concluded_notice(&self, candidate: ElementRef<'_>) -> bool {
        NOTICE.find_in(candidate).is_some_and(|notice| {
            element_text(notice)
                .to_lowercase()
                .contains(&self.concluded_phrase)
        })
    }

    fn has_no_item_marker(&self, candidate: ElementRef<'_>) -> bool {
        NO_ITEM_AVAILABLE.find_in(candidate).is_some()
    }

    fn text_says_sold(&self, candidate: ElementRef<'_>) -> bool {
        if self.sold_word.is_empty() {
            return false;
        }
        let text = element_text(candidate).to_lowercase();
        text.contains(&self.sold_word) && self.concluded_words.iter().any(|w| text.contains(w))
    }

    fn mentions_sold(&self, text: &str) -> bool {
        !self.sold_word.is_empty() && text.to_lowercase().contains(&self.sold_word)
    }
}
