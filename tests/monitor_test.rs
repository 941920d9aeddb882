//! Check-cycle tests against an in-memory page source

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use subwatch::config::{Config, Marketplace};
use subwatch::diagnostics::{NullSink, StageCounts};
use subwatch::error::{Result, SubwatchError};
use subwatch::extract::Extractor;
use subwatch::fetch::PageSource;
use subwatch::monitor::{check_search, Scheduler};
use subwatch::search::{SearchRequest, MAX_CHECK_INTERVAL_MINUTES};

const BASE_URL: &str = "https://www.subito.it/annunci/italia/vendita/usato/?q=bici";

/// Serves canned pages and records every URL requested
struct FakeSource {
    pages: HashMap<String, String>,
    requested: RefCell<Vec<String>>,
}

impl FakeSource {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages.iter().map(|(u, h)| (u.to_string(), h.clone())).collect(),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl PageSource for FakeSource {
    fn fetch_page(&self, url: &str) -> Result<String> {
        self.requested.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| SubwatchError::FetchError(format!("404 for {}", url)))
    }
}

fn card(id: u32, title: &str, price: &str) -> String {
    format!(
        r#"<a class="SmallCard-module_link__hOkzY" href="/biciclette/{id}.html">
             <h2 class="ItemTitle-module_item-title__VuKDo">{title}</h2>
             <p class="index-module_price__N7M2x">{price}</p>
           </a>"#
    )
}

fn page(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.join("\n"))
}

fn search(min: f64, max: f64, pages: u32, limit: usize) -> SearchRequest {
    SearchRequest {
        pages_to_check: pages,
        results_limit: limit,
        ..SearchRequest::new("bici".into(), BASE_URL.into(), min, max)
    }
}

fn two_pages() -> FakeSource {
    FakeSource::new(&[
        (
            BASE_URL,
            page(&[
                card(1, "Bici da corsa", "450 €"),
                card(2, "Bici elettrica", "1.200 €"),
                card(3, "Bici bambino", "40 €"),
            ]),
        ),
        (
            &format!("{}&o=2", BASE_URL),
            page(&[
                card(1, "Bici da corsa", "450 €"),
                card(4, "Bici gravel", "300 €"),
                card(5, "Casco bici", "25 €"),
            ]),
        ),
    ])
}

#[test]
fn test_check_cycle_filters_dedups_and_ranks() {
    let source = two_pages();
    let extractor = Extractor::new(&Marketplace::default());
    let mut counts = StageCounts::default();

    let outcome = check_search(&source, &extractor, &search(30.0, 500.0, 2, 50), Duration::ZERO, &mut counts);

    assert_eq!(outcome.found, 6);
    assert_eq!(outcome.unique, 5);
    let ids: Vec<_> = outcome.listings.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "4", "1"]);
    assert_eq!(outcome.in_range, 3);
    assert_eq!(outcome.pages_failed, 0);
    assert_eq!(counts.extracted, 6);
    assert_eq!(
        *source.requested.borrow(),
        vec![BASE_URL.to_string(), format!("{}&o=2", BASE_URL)]
    );
}

#[test]
fn test_every_result_is_within_price_range() {
    let source = two_pages();
    let extractor = Extractor::new(&Marketplace::default());
    let request = search(40.0, 450.0, 2, 50);

    let outcome = check_search(&source, &extractor, &request, Duration::ZERO, &mut NullSink);
    assert!(!outcome.listings.is_empty());
    assert!(outcome
        .listings
        .iter()
        .all(|l| request.min_price <= l.price && l.price <= request.max_price));
    assert!(outcome.listings.iter().any(|l| l.price == 40.0));
    assert!(outcome.listings.iter().any(|l| l.price == 450.0));
}

#[test]
fn test_results_limit_truncates_after_sort() {
    let source = two_pages();
    let extractor = Extractor::new(&Marketplace::default());

    let outcome = check_search(&source, &extractor, &search(0.0, 5000.0, 2, 2), Duration::ZERO, &mut NullSink);
    let prices: Vec<_> = outcome.listings.iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![25.0, 40.0]);
    assert_eq!(outcome.in_range, 5);
}

#[test]
fn test_failed_page_does_not_abort_cycle() {
    let source = two_pages();
    let extractor = Extractor::new(&Marketplace::default());

    // Page 3 is not served
    let outcome = check_search(&source, &extractor, &search(0.0, 5000.0, 3, 50), Duration::ZERO, &mut NullSink);
    assert_eq!(outcome.pages_checked, 3);
    assert_eq!(outcome.pages_failed, 1);
    assert_eq!(outcome.unique, 5);
}

#[test]
fn test_pause_between_pages_only() {
    let source = two_pages();
    let extractor = Extractor::new(&Marketplace::default());
    let delay = Duration::from_millis(50);

    let started = Instant::now();
    check_search(&source, &extractor, &search(0.0, 5000.0, 2, 50), delay, &mut NullSink);
    let elapsed = started.elapsed();

    assert!(elapsed >= delay);
    assert!(elapsed < delay * 10);
}

#[test]
fn test_scheduler_runs_due_searches_once_per_interval() {
    let source = two_pages();
    let mut config = Config::default();
    config.page_delay_secs = 0;
    config.searches.push(search(0.0, 5000.0, 1, 50));

    let mut scheduler = Scheduler::new(&config, &source);
    let start = Instant::now();

    assert_eq!(scheduler.run_due(start), 1);
    assert_eq!(source.requested.borrow().len(), 1);

    // Not due again until the interval elapses
    assert_eq!(scheduler.run_due(Instant::now()), 0);
    let next = scheduler.next_due().unwrap();
    assert!(next >= start + Duration::from_secs(30 * 60));

    assert_eq!(scheduler.run_due(next), 1);
    assert_eq!(source.requested.borrow().len(), 2);
}

#[test]
fn test_scheduler_survives_oversized_intervals() {
    let source = two_pages();
    let mut config = Config::default();
    config.page_delay_secs = 0;
    for minutes in [u64::MAX / 2, u64::MAX / 61, u64::MAX] {
        let mut request = search(0.0, 5000.0, 1, 50);
        request.check_interval_minutes = minutes;
        config.searches.push(request);
    }

    let mut scheduler = Scheduler::new(&config, &source);
    let start = Instant::now();

    assert_eq!(scheduler.run_due(start), 3);
    let next = scheduler.next_due().unwrap();
    assert!(next >= start + Duration::from_secs(MAX_CHECK_INTERVAL_MINUTES * 60));
    assert_eq!(scheduler.run_due(Instant::now()), 0);
}
