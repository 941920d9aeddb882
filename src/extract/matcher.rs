//! Structural matchers: element predicates configured by class-name patterns

use regex::Regex;
use scraper::ElementRef;

/// A strategy that looks for one element relative to a candidate
pub type ElementStrategy = for<'a> fn(ElementRef<'a>) -> Option<ElementRef<'a>>;

/// Matches elements by tag name and a regex over their class attribute
///
/// The pattern is tested against every individual class and then against the
/// whole attribute value, so hashed module class names
/// (`SmallCard-module_card__x1Y2z`) match on their stable prefix.
#[derive(Debug)]
pub struct ClassMatcher {
    name: &'static str,
    tags: &'static [&'static str],
    pattern: Regex,
}

impl ClassMatcher {
    /// An empty `tags` slice matches any element name
    pub fn new(name: &'static str, tags: &'static [&'static str], pattern: &str) -> Self {
        Self {
            name,
            tags,
            pattern: Regex::new(pattern).expect("Invalid class pattern"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        if !has_tag(element, self.tags) {
            return false;
        }
        let value = element.value();
        match value.attr("class") {
            Some(class) => {
                value.classes().any(|c| self.pattern.is_match(c)) || self.pattern.is_match(class)
            }
            None => false,
        }
    }

    /// First matching descendant of `scope`, excluding `scope` itself
    pub fn find_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(scope).find(|el| self.matches(*el))
    }

    /// All matching elements in `scope`, including `scope`, in document order
    pub fn select_all<'a, 'm>(
        &'m self,
        scope: ElementRef<'a>,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'm
    where
        'a: 'm,
    {
        scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |el| self.matches(*el))
    }
}

/// Descendant elements of `scope`, excluding `scope` itself
pub fn descendants<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    scope.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Enclosing elements, nearest first
pub fn ancestors<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap)
}

/// `element` followed by up to `depth - 1` of its ancestors
pub fn search_scopes<'a>(element: ElementRef<'a>, depth: usize) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::once(element).chain(ancestors(element)).take(depth)
}

pub fn has_tag(element: ElementRef<'_>, tags: &[&str]) -> bool {
    tags.is_empty() || tags.contains(&element.value().name())
}

/// First descendant with one of the given tag names
pub fn find_tag<'a>(scope: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    descendants(scope).find(|el| has_tag(*el, tags))
}

/// All text below `element`, concatenated
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Only the text nodes that are direct children of `element`
pub fn direct_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect()
}

/// Trim and collapse internal runs of whitespace
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
