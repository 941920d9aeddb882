//! Field extraction: ordered fallback strategies per listing field

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::matcher::{
    ancestors, clean_text, descendants, direct_text, element_text, find_tag, has_tag,
    search_scopes, ClassMatcher, ElementStrategy,
};

/// How many scopes (candidate + ancestors) the widened searches inspect
pub const NEARBY_DEPTH: usize = 3;

const HEADING_TAGS: &[&str] = &["h2", "h3", "h4"];

static TITLE_EXACT: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("title-exact", &["h2"], r"ItemTitle-module_item-title__"));

static TITLE_GENERIC: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("title-generic", HEADING_TAGS, r"(title|item-title)"));

static PRICE_EXACT: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("price-exact", &["p"], r"index-module_price__"));

static PRICE_GENERIC: Lazy<ClassMatcher> =
    Lazy::new(|| ClassMatcher::new("price-generic", &["p", "div", "span"], r"price"));

static LOCATION: Lazy<ClassMatcher> = Lazy::new(|| {
    ClassMatcher::new("location", &[], r"(PostingTimeAndPlace|town|city|location)")
});

/// Thousands grouped with '.', optional ',' plus 1-2 decimals; ungrouped digits also accepted
const NUMBER_PATTERN: &str = r"\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?|\d+(?:,\d{1,2})?";

static PRICE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(NUMBER_PATTERN).expect("Invalid price number regex"));

/// A number written next to a euro sign, on either side
static CURRENCY_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"({n})\s*€|€\s*({n})", n = NUMBER_PATTERN))
        .expect("Invalid currency amount regex")
});

static AD_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)\.html").expect("Invalid ad id regex"));

/// Posting-time fragments mixed into the location text ("12 mag alle 14:30", "Oggi alle 9:05")
static DATE_FRAGMENT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d+\s+\w+\s+alle\s+\d+:\d+",
        r"(?i)\b(oggi|ieri)\s+alle\s+\d+:\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid date fragment regex"))
    .collect()
});

const TITLE_STRATEGIES: &[ElementStrategy] = &[title_exact, title_generic, title_nearby_heading];

const PRICE_STRATEGIES: &[ElementStrategy] = &[price_exact, price_generic, price_nearby];

type LinkStrategy = for<'a> fn(ElementRef<'a>) -> Option<&'a str>;

const LINK_STRATEGIES: &[LinkStrategy] = &[self_href, descendant_href, enclosing_href];

fn first_element<'a>(strategies: &[ElementStrategy], item: ElementRef<'a>) -> Option<ElementRef<'a>> {
    strategies.iter().find_map(|strategy| strategy(item))
}

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

fn title_exact(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    TITLE_EXACT.find_in(item)
}

fn title_generic(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    TITLE_GENERIC.find_in(item)
}

fn title_nearby_heading(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    search_scopes(item, NEARBY_DEPTH).find_map(|scope| find_tag(scope, HEADING_TAGS))
}

/// The title element of a candidate
pub fn find_title_element(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    first_element(TITLE_STRATEGIES, item)
}

/// Cleaned title text; `None` when no heading is found or it is blank
pub fn extract_title(item: ElementRef<'_>) -> Option<String> {
    find_title_element(item)
        .map(|el| clean_text(&element_text(el)))
        .filter(|title| !title.is_empty())
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

fn price_exact(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    PRICE_EXACT.find_in(item)
}

fn price_generic(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    PRICE_GENERIC.find_in(item)
}

fn price_nearby(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    search_scopes(item, NEARBY_DEPTH).find_map(|scope| PRICE_GENERIC.find_in(scope))
}

/// Where a candidate's price was found
#[derive(Debug, Clone)]
pub enum PriceSource<'a> {
    /// A dedicated price element
    Element(ElementRef<'a>),
    /// A currency amount scanned out of the candidate's full text
    Text(String),
}

impl PriceSource<'_> {
    /// Raw price text, preferring the element's own text nodes over nested badges
    pub fn raw_text(&self) -> String {
        match self {
            PriceSource::Element(el) => {
                let own = direct_text(*el);
                let own = own.trim();
                if own.is_empty() {
                    element_text(*el).trim().to_string()
                } else {
                    own.to_string()
                }
            }
            PriceSource::Text(text) => text.clone(),
        }
    }
}

/// Locate the price of a candidate, falling back to a currency scan of its text
pub fn find_price(item: ElementRef<'_>) -> Option<PriceSource<'_>> {
    if let Some(el) = first_element(PRICE_STRATEGIES, item) {
        return Some(PriceSource::Element(el));
    }
    scan_currency_amount(&element_text(item)).map(PriceSource::Text)
}

/// First euro amount in free text, without the currency sign
pub fn scan_currency_amount(text: &str) -> Option<String> {
    CURRENCY_AMOUNT_RE.captures(text).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}

/// Parse a localized price such as "1.234,50 €" into 1234.5
pub fn parse_price(raw: &str) -> Option<f64> {
    let number = PRICE_NUMBER_RE.find(raw)?.as_str();
    let normalized = number.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

// ---------------------------------------------------------------------------
// Link and id
// ---------------------------------------------------------------------------

fn href(element: ElementRef<'_>) -> Option<&str> {
    if !has_tag(element, &["a"]) {
        return None;
    }
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

fn self_href(item: ElementRef<'_>) -> Option<&str> {
    href(item)
}

fn descendant_href(item: ElementRef<'_>) -> Option<&str> {
    descendants(item).find_map(href)
}

fn enclosing_href(item: ElementRef<'_>) -> Option<&str> {
    ancestors(item)
        .take_while(|el| el.value().name() != "html")
        .find_map(href)
}

/// The raw (possibly relative) link of a candidate
pub fn extract_href(item: ElementRef<'_>) -> Option<&str> {
    LINK_STRATEGIES.iter().find_map(|strategy| strategy(item))
}

/// Resolve `link` against `origin` unless it already carries a scheme
pub fn absolutize_url(link: &str, origin: &str) -> String {
    if url::Url::parse(link).is_ok() {
        return link.to_string();
    }
    match url::Url::parse(origin).and_then(|base| base.join(link)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            link.trim_start_matches('/')
        ),
    }
}

/// Numeric ad id from `/<digits>.html`, else the last path segment
pub fn extract_id(link: &str) -> String {
    if let Some(caps) = AD_ID_RE.captures(link) {
        return caps[1].to_string();
    }

    if let Ok(parsed) = url::Url::parse(link) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }

    link.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(link)
        .to_string()
}

// ---------------------------------------------------------------------------
// Optional fields
// ---------------------------------------------------------------------------

/// Town/city text with posting-time fragments removed
pub fn extract_location(item: ElementRef<'_>) -> Option<String> {
    let element = LOCATION.find_in(item)?;
    let mut text = element_text(element);
    for re in DATE_FRAGMENT_RES.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    let text = clean_text(&text);
    (!text.is_empty()).then_some(text)
}

/// `src` of the first image in the candidate
pub fn extract_image(item: ElementRef<'_>) -> Option<String> {
    find_tag(item, &["img"])?
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const ORIGIN: &str = "https://www.subito.it";

    fn with_class<'a>(doc: &'a Html, class: &str) -> ElementRef<'a> {
        doc.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().attr("class") == Some(class))
            .unwrap()
    }

    #[test]
    fn test_parse_price_localized() {
        assert_eq!(parse_price("1.234,50 €"), Some(1234.50));
        assert_eq!(parse_price("€ 99"), Some(99.0));
        assert_eq!(parse_price("250,5"), Some(250.5));
        assert_eq!(parse_price("1500 €"), Some(1500.0));
        assert_eq!(parse_price("Prezzo su richiesta"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_scan_currency_amount_either_side() {
        assert_eq!(scan_currency_amount("Bici da corsa 1.100 € Milano").as_deref(), Some("1.100"));
        assert_eq!(scan_currency_amount("solo € 45,90 trattabili").as_deref(), Some("45,90"));
        assert_eq!(scan_currency_amount("nessun prezzo 2024"), None);
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(
            extract_id("https://www.subito.it/telefonia/iphone-12-milano-123456789.html"),
            "iphone-12-milano-123456789.html"
        );
        assert_eq!(extract_id("https://www.subito.it/annuncio/123456789.html"), "123456789");
        assert_eq!(extract_id("https://www.subito.it/annunci/abc-def"), "abc-def");
        assert_eq!(extract_id("https://www.subito.it/annunci/abc-def/"), "abc-def");
        assert_eq!(extract_id("https://www.subito.it/annunci/abc-def?from=list"), "abc-def");
    }

    #[test]
    fn test_absolutize_url() {
        assert_eq!(
            absolutize_url("/annuncio/x.html", ORIGIN),
            "https://www.subito.it/annuncio/x.html"
        );
        assert_eq!(
            absolutize_url("https://other.example/annuncio/x.html", ORIGIN),
            "https://other.example/annuncio/x.html"
        );
    }

    #[test]
    fn test_title_fallback_chain() {
        let exact = Html::parse_fragment(
            r#"<div class="card"><h3 class="title">generic</h3><h2 class="ItemTitle-module_item-title__ab">exact</h2></div>"#,
        );
        assert_eq!(extract_title(with_class(&exact, "card")).as_deref(), Some("exact"));

        let generic = Html::parse_fragment(
            r#"<div class="card"><h2>plain</h2><h3 class="ad-title">generic</h3></div>"#,
        );
        assert_eq!(extract_title(with_class(&generic, "card")).as_deref(), Some("generic"));

        let nearby = Html::parse_fragment(
            r#"<section><h4>  Divano   letto </h4><div class="wrap"><div class="card">img</div></div></section>"#,
        );
        assert_eq!(extract_title(with_class(&nearby, "card")).as_deref(), Some("Divano letto"));
    }

    #[test]
    fn test_title_missing() {
        let doc = Html::parse_fragment(r#"<div><div class="card"><p>no heading</p></div></div>"#);
        assert_eq!(extract_title(with_class(&doc, "card")), None);
    }

    #[test]
    fn test_price_prefers_exact_and_own_text() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><span class="old-price">999 €</span><p class="index-module_price__N7M2x">120 €<span class="shipping-badge">+ 5 € spedizione</span></p></div>"#,
        );
        let source = find_price(with_class(&doc, "card")).unwrap();
        assert!(matches!(source, PriceSource::Element(_)));
        assert_eq!(source.raw_text(), "120 €");
        assert_eq!(parse_price(&source.raw_text()), Some(120.0));
    }

    #[test]
    fn test_price_from_ancestor() {
        let doc = Html::parse_fragment(
            r#"<div class="outer"><div class="card"><h2>TV</h2></div><span class="price">300 €</span></div>"#,
        );
        let source = find_price(with_class(&doc, "card")).unwrap();
        assert_eq!(source.raw_text(), "300 €");
    }

    #[test]
    fn test_price_text_scan_fallback() {
        let doc = Html::parse_fragment(r#"<div class="card"><h2>TV</h2><em>solo 80 €</em></div>"#);
        let source = find_price(with_class(&doc, "card")).unwrap();
        assert!(matches!(source, PriceSource::Text(ref t) if t == "80"));
    }

    #[test]
    fn test_price_absent() {
        let doc = Html::parse_fragment(r#"<div class="card"><h2>TV</h2><em>regalo</em></div>"#);
        assert!(find_price(with_class(&doc, "card")).is_none());
    }

    #[test]
    fn test_link_strategies() {
        let own = Html::parse_fragment(r#"<a class="card" href="/a/1.html"><h2>x</h2></a>"#);
        assert_eq!(extract_href(with_class(&own, "card")), Some("/a/1.html"));

        let inner = Html::parse_fragment(
            r#"<div class="card"><a>no href</a><a href="/a/2.html">x</a></div>"#,
        );
        assert_eq!(extract_href(with_class(&inner, "card")), Some("/a/2.html"));

        let outer = Html::parse_fragment(
            r#"<a href="/a/3.html"><div><div class="card">x</div></div></a>"#,
        );
        assert_eq!(extract_href(with_class(&outer, "card")), Some("/a/3.html"));

        let none = Html::parse_fragment(r#"<div class="card">x</div>"#);
        assert_eq!(extract_href(with_class(&none, "card")), None);
    }

    #[test]
    fn test_location_strips_posting_time() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><span class="PostingTimeAndPlace-module_date-location__x">Milano (MI) 12 mag alle 14:30</span></div>"#,
        );
        assert_eq!(extract_location(with_class(&doc, "card")).as_deref(), Some("Milano (MI)"));

        let today = Html::parse_fragment(
            r#"<div class="card"><span class="town">Oggi alle 9:05 Roma</span></div>"#,
        );
        assert_eq!(extract_location(with_class(&today, "card")).as_deref(), Some("Roma"));

        let none = Html::parse_fragment(r#"<div class="card"><span>x</span></div>"#);
        assert_eq!(extract_location(with_class(&none, "card")), None);
    }

    #[test]
    fn test_image() {
        let doc = Html::parse_fragment(r#"<div class="card"><img src="https://img/x.jpg"></div>"#);
        assert_eq!(extract_image(with_class(&doc, "card")).as_deref(), Some("https://img/x.jpg"));

        let missing = Html::parse_fragment(r#"<div class="card"><img alt="x"></div>"#);
        assert_eq!(extract_image(with_class(&missing, "card")), None);
    }
}
