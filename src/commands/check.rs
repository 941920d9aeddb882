//! Check and monitoring commands: test, monitor, run

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use subwatch::cli::{DEFAULT_TEST_PRODUCT, FALLBACK_TEST_TERM};
use subwatch::config::Config;
use subwatch::diagnostics::{StageCounts, Tee, TracingSink};
use subwatch::error::{Result, SubwatchError};
use subwatch::extract::Extractor;
use subwatch::fetch::{HttpFetcher, PageSource};
use subwatch::monitor::Scheduler;
use subwatch::report;
use subwatch::search::{build_search_url, validate_price_range, SearchRequest};

use crate::utils::format_minutes;

/// Results shown by test mode
const TEST_RESULTS_SHOWN: usize = 20;

/// Options shared by the commands that build a search from flags
pub struct SearchFlags {
    pub category: Option<String>,
    pub region: Option<String>,
    pub interval: u64,
    pub limit: usize,
    pub pages: u32,
}

/// Fetch one results page and show what the extractor finds
pub fn cmd_test(
    config_path: Option<&Path>,
    url: Option<String>,
    product: Option<String>,
    flags: &SearchFlags,
    json: bool,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let origin = &config.marketplace.origin;

    let test_url = match (&url, &product) {
        (Some(u), _) => u.clone(),
        (None, Some(p)) => build_search_url(origin, p, flags.category.as_deref(), flags.region.as_deref()),
        (None, None) => build_search_url(origin, DEFAULT_TEST_PRODUCT, None, None),
    };
    let term = product.as_deref().unwrap_or(FALLBACK_TEST_TERM);

    if !json {
        println!("\n{} {}", "Fetching".cyan().bold(), test_url);
    }

    let fetcher = HttpFetcher::from_config(&config);
    let html = fetcher.fetch_page(&test_url)?;

    let extractor = Extractor::new(&config.marketplace);
    let mut counts = StageCounts::default();
    let mut log_sink = TracingSink;
    let listings = {
        let mut sink = Tee { first: &mut counts, second: &mut log_sink };
        extractor.extract_listings(&html, term, &mut sink)
    };
    let shown = &listings[..listings.len().min(TEST_RESULTS_SHOWN)];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    println!("  {} Fetched {} bytes of HTML", "✓".green(), html.len());
    println!(
        "  {} {} candidates, {} skipped, {} listings",
        "✓".green(),
        counts.located,
        counts.total_skipped(),
        listings.len()
    );
    for (kind, count) in &counts.skipped {
        println!("      {} {}", format!("{:>4}", count).dimmed(), kind.replace('_', " ").dimmed());
    }

    println!("\nTest results for '{}':", test_url);
    println!("Found {} listings", listings.len());
    println!("{}", "-".repeat(80));
    print!("{}", report::render_listings(shown));

    Ok(())
}

/// Replace the saved searches with one built from flags, then monitor it
pub fn cmd_monitor(
    config_path: Option<PathBuf>,
    product: String,
    min: f64,
    max: f64,
    flags: &SearchFlags,
) -> Result<()> {
    validate_price_range(min, max)?;

    let mut config = Config::load_or_default(config_path.as_deref());
    let search_url = build_search_url(
        &config.marketplace.origin,
        &product,
        flags.category.as_deref(),
        flags.region.as_deref(),
    );

    let search = SearchRequest {
        results_limit: flags.limit,
        pages_to_check: flags.pages,
        check_interval_minutes: flags.interval,
        ..SearchRequest::new(product, search_url, min, max)
    };
    search.validate()?;

    config.searches = vec![search.clone()];
    let saved = match &config_path {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    if let Err(e) = saved {
        warn!("could not save configuration, monitoring anyway: {}", e);
    }

    println!(
        "\n{} '{}' between {} and {}",
        "Monitoring".cyan().bold(),
        search.product_name,
        report::format_price(min),
        report::format_price(max)
    );
    println!("  Search URL: {}", search.search_url);
    println!(
        "  Checking {} page(s) every {}",
        search.pages_to_check,
        format_minutes(search.check_interval_minutes)
    );

    monitor(&config)
}

/// Monitor the searches already saved in the config file
pub fn cmd_run(config_path: Option<PathBuf>) -> Result<()> {
    let mut config = Config::load_or_default(config_path.as_deref());

    config.searches.retain(|search| match search.validate() {
        Ok(()) => true,
        Err(e) => {
            warn!("skipping saved search '{}': {}", search.product_name, e);
            false
        }
    });

    if config.searches.is_empty() {
        println!("No saved searches. Add one with `subwatch --product NAME --max PRICE`.");
        return Ok(());
    }

    println!("\n{} {} saved searches:\n", "Monitoring".cyan().bold(), config.searches.len());
    for search in &config.searches {
        println!(
            "  {} - every {}",
            search.product_name,
            format_minutes(search.check_interval_minutes)
        );
    }

    monitor(&config)
}

/// Run the scheduler until Ctrl+C
fn monitor(config: &Config) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\n\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| SubwatchError::ConfigError(format!("Failed to set Ctrl+C handler: {}", e)))?;

    println!("\nPress {} to stop.", "Ctrl+C".yellow());
    info!("price monitor starting");

    let fetcher = HttpFetcher::from_config(config);
    Scheduler::new(config, &fetcher).run(&running);
    Ok(())
}
