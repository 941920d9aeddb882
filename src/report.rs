//! Human-readable result reports

use chrono::{DateTime, Local};
use tracing::info;

use crate::monitor::CheckOutcome;
use crate::search::{Listing, SearchRequest};

const RULE_WIDTH: usize = 80;

/// Format a price the way the marketplace shows it, without thousands separators
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("€{:.0}", price)
    } else {
        format!("€{:.2}", price)
    }
}

/// Numbered listing lines: title, price, optional location, then the link
pub fn render_listings(listings: &[Listing]) -> String {
    let mut out = String::new();
    for (i, listing) in listings.iter().enumerate() {
        let location = listing
            .location
            .as_deref()
            .map(|l| format!(" - {}", l))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}. {} - {}{}\n",
            i + 1,
            listing.title,
            format_price(listing.price),
            location
        ));
        out.push_str(&format!("   {}\n\n", listing.link));
    }
    out
}

/// Full report for one check cycle
pub fn render(search: &SearchRequest, outcome: &CheckOutcome, checked_at: DateTime<Local>) -> String {
    let range = format!(
        "{}-{}",
        format_price(search.min_price),
        format_price(search.max_price)
    );
    let stamp = checked_at.format("%Y-%m-%d %H:%M");

    if outcome.listings.is_empty() {
        return format!(
            "\n[{}] No listings found for '{}' in price range {}\n",
            stamp, search.product_name, range
        );
    }

    let mut out = format!(
        "\n[{}] Results for '{}' (range {}):\n{}\n",
        stamp,
        search.product_name,
        range,
        "-".repeat(RULE_WIDTH)
    );
    out.push_str(&render_listings(&outcome.listings));
    if outcome.pages_failed > 0 {
        out.push_str(&format!(
            "({} of {} pages could not be fetched)\n",
            outcome.pages_failed, outcome.pages_checked
        ));
    }
    out
}

/// Print the report to stdout and record it in the process log
pub fn publish(search: &SearchRequest, outcome: &CheckOutcome) {
    let text = render(search, outcome, Local::now());
    print!("{}", text);
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        info!(target: "subwatch::report", "{}", line);
    }
}
