//! Title relevance against the search term

/// Lowercased whitespace-separated search terms
pub fn search_terms(search_term: &str) -> Vec<String> {
    search_term
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Fraction of `terms` that appear as substrings of `title`
pub fn match_ratio(title: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let title = title.to_lowercase();
    let matched = terms.iter().filter(|t| title.contains(t.as_str())).count();
    matched as f64 / terms.len() as f64
}

/// Whether `title` is relevant to `search_term`
///
/// A single-term search needs that term in the title. A multi-term search
/// needs at least `threshold` of its terms, even when one of them matches on
/// its own; an empty search term accepts every title.
pub fn is_relevant(title: &str, search_term: &str, threshold: f64) -> bool {
    let terms = search_terms(search_term);
    match terms.len() {
        0 => true,
        1 => title.to_lowercase().contains(terms[0].as_str()),
        _ => match_ratio(title, &terms) >= threshold,
    }
}
