//! Next-page detection strategies
//!
//! Pagination markup is the part of the portal most likely to change, so
//! each heuristic is a separate [`NextPageStrategy`]. [`Pagination`] tries
//! them in order and the first one that finds a URL wins.

use crate::config::HeuristicsConfig;
use crate::crawler::parser::{Anchor, ParsedPage};
use url::Url;

/// A single heuristic for locating the next listing page
pub trait NextPageStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns the next page URL if this heuristic recognizes one
    fn next_page(&self, page: &ParsedPage, current: &Url) -> Option<Url>;
}

/// Matches anchors whose text, `aria-label` or `title` reads "next"/"siguiente"
pub struct NextLabelStrategy {
    labels: Vec<String>,
}

impl NextLabelStrategy {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return false;
        }

        self.labels.iter().any(|label| {
            if label.chars().any(char::is_alphanumeric) {
                // Word labels match a whole word: "Página siguiente", "Next ›"
                text.split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == label)
            } else {
                // Symbol labels must be the whole text: "»", ">>"
                text == *label
            }
        })
    }
}

impl NextPageStrategy for NextLabelStrategy {
    fn name(&self) -> &'static str {
        "next-label"
    }

    fn next_page(&self, page: &ParsedPage, _current: &Url) -> Option<Url> {
        page.anchors
            .iter()
            .find(|a| self.matches(&a.text) || a.label.as_deref().is_some_and(|l| self.matches(l)))
            .map(|a| a.href.clone())
    }
}

/// Matches `<a rel="next">` or `<link rel="next">`
pub struct RelNextStrategy;

impl NextPageStrategy for RelNextStrategy {
    fn name(&self) -> &'static str {
        "rel-next"
    }

    fn next_page(&self, page: &ParsedPage, _current: &Url) -> Option<Url> {
        let is_next = |a: &&Anchor| {
            a.rel
                .as_deref()
                .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
        };

        page.anchors
            .iter()
            .find(is_next)
            .or_else(|| page.head_links.iter().find(is_next))
            .map(|a| a.href.clone())
    }
}

/// Matches a numbered pagination link one greater than the current page
///
/// The page number is read from a `page` query parameter or a `/page/N`
/// path segment. A URL without either counts as page 0, which fits the
/// zero-based `?page=N` scheme of Drupal portals.
pub struct NumberedPageStrategy;

impl NextPageStrategy for NumberedPageStrategy {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn next_page(&self, page: &ParsedPage, current: &Url) -> Option<Url> {
        let wanted = page_number(current).unwrap_or(0).checked_add(1)?;

        page.anchors
            .iter()
            .find(|a| a.href.host_str() == current.host_str() && page_number(&a.href) == Some(wanted))
            .map(|a| a.href.clone())
    }
}

/// Reads the page number of a listing URL
pub fn page_number(url: &Url) -> Option<u32> {
    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse().ok());

    from_query.or_else(|| {
        let segments: Vec<_> = url.path_segments()?.collect();
        segments
            .windows(2)
            .rev()
            .find(|pair| pair[0] == "page")
            .and_then(|pair| pair[1].parse().ok())
    })
}

/// Ordered list of next-page strategies
pub struct Pagination {
    strategies: Vec<Box<dyn NextPageStrategy>>,
}

impl Pagination {
    pub fn new(strategies: Vec<Box<dyn NextPageStrategy>>) -> Self {
        Self { strategies }
    }

    /// Default order: label text, then `rel="next"`, then numbered links
    pub fn from_config(heuristics: &HeuristicsConfig) -> Self {
        Self::new(vec![
            Box::new(NextLabelStrategy::new(&heuristics.next_link_texts)),
            Box::new(RelNextStrategy),
            Box::new(NumberedPageStrategy),
        ])
    }

    /// Returns the first next-page URL found that differs from `current`
    pub fn next_page(&self, page: &ParsedPage, current: &Url) -> Option<Url> {
        self.strategies.iter().find_map(|strategy| {
            let next = strategy.next_page(page, current).filter(|url| url != current)?;
            tracing::debug!("Next page via {}: {}", strategy.name(), next);
            Some(next)
        })
    }
}
