//! Candidate locator: finds the elements that probably hold one listing each

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html};

use super::matcher::ClassMatcher;
use crate::diagnostics::DiagnosticSink;

/// Item-card structures, most specific first. Every stage runs; results are unioned.
static CARD_MATCHERS: Lazy<Vec<ClassMatcher>> = Lazy::new(|| {
    vec![
        ClassMatcher::new("small-card-picture-group", &["div"], r"^SmallCard-module_picture-group__"),
        ClassMatcher::new("small-card-key-data", &["div"], r"^SmallCard-module_item-key-data__"),
        ClassMatcher::new("small-card-link", &["a"], r"^SmallCard-module_link__"),
        ClassMatcher::new("item-card-link", &["a"], r"^ItemCard-module_card__"),
        ClassMatcher::new("small-card-any", &["div"], r"SmallCard-module"),
        ClassMatcher::new("item-card-any", &["div"], r"ItemCard-module"),
    ]
});

/// Used only when no card stage matched anything
static FALLBACK_MATCHER: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("card-like", &["div", "a"], r"(SmallCard|ItemCard|Card)"));

/// Locate listing candidates, deduplicated by serialized markup, first-seen order
pub fn locate_candidates<'a>(
    document: &'a Html,
    sink: &mut dyn DiagnosticSink,
) -> Vec<ElementRef<'a>> {
    let root = document.root_element();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for matcher in CARD_MATCHERS.iter() {
        let matched: Vec<_> = matcher.select_all(root).collect();
        sink.stage_matched(matcher.name(), matched.len());
        push_unique(matched, &mut seen, &mut candidates);
    }

    if candidates.is_empty() {
        let matched: Vec<_> = FALLBACK_MATCHER.select_all(root).collect();
        sink.stage_matched(FALLBACK_MATCHER.name(), matched.len());
        push_unique(matched, &mut seen, &mut candidates);
    }

    sink.candidates_located(candidates.len());
    candidates
}

fn push_unique<'a>(
    matched: Vec<ElementRef<'a>>,
    seen: &mut HashSet<String>,
    candidates: &mut Vec<ElementRef<'a>>,
) {
    for element in matched {
        if seen.insert(element.html()) {
            candidates.push(element);
        }
    }
}
