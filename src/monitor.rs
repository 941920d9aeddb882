//! Search orchestration and the polling scheduler

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::extract::Extractor;
use crate::fetch::PageSource;
use crate::report;
use crate::search::{Listing, SearchRequest, MAX_CHECK_INTERVAL_MINUTES};

/// How often the scheduler wakes up to look for due searches
pub const TICK: Duration = Duration::from_secs(1);

/// Result of one check cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    /// Ranked listings inside the price range, truncated to the results limit
    pub listings: Vec<Listing>,
    /// Listings extracted across all pages, before dedup
    pub found: usize,
    /// Listings left after cross-page dedup
    pub unique: usize,
    /// Unique listings inside the price range, before truncation
    pub in_range: usize,
    pub pages_checked: u32,
    pub pages_failed: u32,
}

/// URL of results page `page` (1-based) of a search
pub fn page_url(search_url: &str, page: u32) -> String {
    if page <= 1 {
        return search_url.to_string();
    }
    let separator = if search_url.contains('?') { '&' } else { '?' };
    format!("{}{}o={}", search_url, separator, page)
}

/// Drop later listings that repeat an id already seen
pub fn dedup_by_id(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.id.clone()))
        .collect()
}

/// Keep listings whose price is within the search's inclusive range
pub fn filter_price_range(listings: Vec<Listing>, search: &SearchRequest) -> Vec<Listing> {
    listings
        .into_iter()
        .filter(|listing| search.accepts_price(listing.price))
        .collect()
}

/// Sort by ascending price (stable) and keep the first `limit`
pub fn rank(mut listings: Vec<Listing>, limit: usize) -> Vec<Listing> {
    listings.sort_by(|a, b| a.price.total_cmp(&b.price));
    listings.truncate(limit);
    listings
}

/// Fetch and extract every page of a search, then filter, dedup and rank
///
/// A page that fails to fetch is logged and skipped; the cycle continues.
pub fn check_search(
    source: &dyn PageSource,
    extractor: &Extractor,
    search: &SearchRequest,
    page_delay: Duration,
    sink: &mut dyn DiagnosticSink,
) -> CheckOutcome {
    info!(
        "checking '{}' (€{} - €{})",
        search.product_name, search.min_price, search.max_price
    );

    let mut outcome = CheckOutcome::default();
    let mut all = Vec::new();
    let pages = search.pages_to_check.max(1);

    for page in 1..=pages {
        let url = page_url(&search.search_url, page);
        info!("page {}/{}: {}", page, pages, url);
        outcome.pages_checked += 1;

        match source.fetch_page(&url) {
            Ok(html) => {
                let listings = extractor.extract_listings(&html, &search.product_name, sink);
                info!(page, count = listings.len(), "listings extracted");
                all.extend(listings);
            }
            Err(e) => {
                error!("could not fetch page {} of '{}': {}", page, search.product_name, e);
                outcome.pages_failed += 1;
            }
        }

        if page < pages && !page_delay.is_zero() {
            std::thread::sleep(page_delay);
        }
    }

    outcome.found = all.len();
    let unique = dedup_by_id(all);
    outcome.unique = unique.len();

    let in_range = filter_price_range(unique, search);
    outcome.in_range = in_range.len();
    outcome.listings = rank(in_range, search.results_limit);

    info!(
        found = outcome.found,
        unique = outcome.unique,
        in_range = outcome.in_range,
        reported = outcome.listings.len(),
        "check of '{}' complete",
        search.product_name
    );
    outcome
}

/// Polls the configured searches and runs each one when its interval elapses
pub struct Scheduler<'a> {
    config: &'a Config,
    source: &'a dyn PageSource,
    extractor: Extractor,
    /// `None` once a search can no longer be scheduled
    next_due: Vec<Option<Instant>>,
}

impl<'a> Scheduler<'a> {
    /// Every search is due immediately
    pub fn new(config: &'a Config, source: &'a dyn PageSource) -> Self {
        let now = Instant::now();
        Self {
            config,
            source,
            extractor: Extractor::new(&config.marketplace),
            next_due: vec![Some(now); config.searches.len()],
        }
    }

    /// Run every search that is due at `now`; returns how many ran
    pub fn run_due(&mut self, now: Instant) -> usize {
        let page_delay = Duration::from_secs(self.config.page_delay_secs);
        let mut ran = 0;

        for (index, search) in self.config.searches.iter().enumerate() {
            match self.next_due[index] {
                Some(due) if now >= due => {}
                _ => continue,
            }

            let outcome = check_search(
                self.source,
                &self.extractor,
                search,
                page_delay,
                &mut TracingSink,
            );
            report::publish(search, &outcome);
            ran += 1;

            let finished = Instant::now();
            self.next_due[index] = finished.checked_add(interval(search));
            if self.next_due[index].is_none() {
                warn!("'{}' cannot be rescheduled; it will not run again", search.product_name);
            }
        }
        ran
    }

    /// When the next search becomes due
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due.iter().flatten().min().copied()
    }

    /// Loop until `running` is cleared, checking between ticks
    pub fn run(&mut self, running: &AtomicBool) {
        if self.config.searches.is_empty() {
            warn!("no searches configured; nothing to monitor");
            return;
        }

        for search in &self.config.searches {
            info!(
                "scheduled '{}' every {} minutes",
                search.product_name, search.check_interval_minutes
            );
        }

        while running.load(Ordering::SeqCst) {
            self.run_due(Instant::now());
            std::thread::sleep(TICK);
        }
        info!("monitoring stopped");
    }
}

/// Interval between checks, clamped to 1 minute..1 year
fn interval(search: &SearchRequest) -> Duration {
    let minutes = search
        .check_interval_minutes
        .clamp(1, MAX_CHECK_INTERVAL_MINUTES);
    Duration::from_secs(minutes.saturating_mul(60))
}
