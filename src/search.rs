use serde::{Deserialize, Serialize};

use crate::error::{Result, SubwatchError};

/// Fallback category path segment when none is given
pub const DEFAULT_CATEGORY: &str = "annunci";

/// Fallback region path segment when none is given
pub const DEFAULT_REGION: &str = "italia";

/// Longest accepted check interval: one year
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

fn default_results_limit() -> usize {
    50
}

fn default_pages_to_check() -> u32 {
    1
}

fn default_check_interval() -> u64 {
    30
}

/// A recurring search definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    /// Search term, also used for relevance scoring
    pub product_name: String,
    /// First results page of the search
    pub search_url: String,
    /// Lowest accepted price (inclusive)
    #[serde(default)]
    pub min_price: f64,
    /// Highest accepted price (inclusive)
    pub max_price: f64,
    /// Maximum number of ranked results reported per check
    #[serde(default = "default_results_limit")]
    pub results_limit: usize,
    /// Number of result pages fetched per check
    #[serde(default = "default_pages_to_check")]
    pub pages_to_check: u32,
    /// Minutes between checks
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
}

impl SearchRequest {
    /// Create a search with default limit, page count and interval
    pub fn new(product_name: String, search_url: String, min_price: f64, max_price: f64) -> Self {
        Self {
            product_name,
            search_url,
            min_price,
            max_price,
            results_limit: default_results_limit(),
            pages_to_check: default_pages_to_check(),
            check_interval_minutes: default_check_interval(),
        }
    }

    /// Reject price ranges and counts that cannot produce a meaningful check
    pub fn validate(&self) -> Result<()> {
        validate_price_range(self.min_price, self.max_price)?;

        if self.pages_to_check == 0 {
            return Err(SubwatchError::ValidationError(
                "at least one page must be checked".into(),
            ));
        }
        if self.results_limit == 0 {
            return Err(SubwatchError::ValidationError(
                "results limit must be at least 1".into(),
            ));
        }
        if self.check_interval_minutes == 0 {
            return Err(SubwatchError::ValidationError(
                "check interval must be at least 1 minute".into(),
            ));
        }
        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(SubwatchError::ValidationError(format!(
                "check interval cannot exceed {} minutes (one year)",
                MAX_CHECK_INTERVAL_MINUTES
            )));
        }
        Ok(())
    }

    /// Whether a price falls inside this search's inclusive range
    pub fn accepts_price(&self, price: f64) -> bool {
        self.min_price <= price && price <= self.max_price
    }
}

/// Check that a price range is non-negative and ordered
pub fn validate_price_range(min_price: f64, max_price: f64) -> Result<()> {
    if min_price < 0.0 || max_price < 0.0 {
        return Err(SubwatchError::ValidationError(
            "prices cannot be negative".into(),
        ));
    }
    if min_price > max_price {
        return Err(SubwatchError::ValidationError(format!(
            "minimum price {} is greater than maximum price {}",
            min_price, max_price
        )));
    }
    Ok(())
}

/// A listing extracted from a results page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Numeric ad id from the link, or the last path segment
    pub id: String,
    pub title: String,
    pub price: f64,
    /// Always absolute
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Build a marketplace search URL:
/// `{origin}/{category}/{region}/vendita/usato/?q={product}`
pub fn build_search_url(
    origin: &str,
    product_name: &str,
    category: Option<&str>,
    region: Option<&str>,
) -> String {
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_lowercase();
    let region = region
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REGION)
        .to_lowercase();
    let query: String = url::form_urlencoded::byte_serialize(product_name.as_bytes()).collect();

    format!(
        "{}/{}/{}/vendita/usato/?q={}",
        origin.trim_end_matches('/'),
        category,
        region,
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.subito.it";

    #[test]
    fn test_build_search_url_defaults() {
        let url = build_search_url(ORIGIN, "iphone 12", None, None);
        assert_eq!(
            url,
            "https://www.subito.it/annunci/italia/vendita/usato/?q=iphone+12"
        );
    }

    #[test]
    fn test_build_search_url_category_and_region() {
        let url = build_search_url(ORIGIN, "divano", Some("arredamento"), Some("Lombardia"));
        assert_eq!(
            url,
            "https://www.subito.it/arredamento/lombardia/vendita/usato/?q=divano"
        );
    }

    #[test]
    fn test_build_search_url_encodes_special_chars() {
        let url = build_search_url("https://www.subito.it/", "tv 4k & hdr", None, Some("lazio"));
        assert!(url.starts_with("https://www.subito.it/annunci/lazio/"));
        assert!(url.ends_with("?q=tv+4k+%26+hdr"));
    }

    #[test]
    fn test_validate_rejects_negative_prices() {
        assert!(validate_price_range(-1.0, 10.0).is_err());
        assert!(validate_price_range(0.0, -10.0).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        assert!(validate_price_range(500.0, 100.0).is_err());
        assert!(validate_price_range(100.0, 100.0).is_ok());
    }

    #[test]
    fn test_search_request_validate_counts() {
        let mut search = SearchRequest::new("tv".into(), "u".into(), 0.0, 100.0);
        assert!(search.validate().is_ok());
        search.pages_to_check = 0;
        assert!(search.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_check_interval() {
        let mut search = SearchRequest::new("tv".into(), "u".into(), 0.0, 100.0);
        search.check_interval_minutes = MAX_CHECK_INTERVAL_MINUTES;
        assert!(search.validate().is_ok());

        search.check_interval_minutes = MAX_CHECK_INTERVAL_MINUTES + 1;
        assert!(search.validate().is_err());
        search.check_interval_minutes = u64::MAX;
        assert!(search.validate().is_err());
    }

    #[test]
    fn test_accepts_price_inclusive() {
        let search = SearchRequest::new("tv".into(), "u".into(), 100.0, 200.0);
        assert!(search.accepts_price(100.0));
        assert!(search.accepts_price(200.0));
        assert!(!search.accepts_price(99.99));
        assert!(!search.accepts_price(200.01));
    }

    #[test]
    fn test_search_request_serde_defaults() {
        let search: SearchRequest = toml::from_str(
            r#"
            product_name = "tv"
            search_url = "https://www.subito.it/annunci/italia/vendita/usato/?q=tv"
            max_price = 300.0
            "#,
        )
        .unwrap();
        assert_eq!(search.min_price, 0.0);
        assert_eq!(search.results_limit, 50);
        assert_eq!(search.pages_to_check, 1);
        assert_eq!(search.check_interval_minutes, 30);
    }
}
