//! HTML parser for extracting anchors, candidates and page metadata
//!
//! This module handles parsing HTML content to extract:
//! - Anchors (text, absolute href, `rel`, `aria-label`/`title`)
//! - `<link rel=...>` elements from the head (for `rel="next"`)
//! - Identifying text of a page (title, headings, breadcrumb)
//!
//! On top of that, [`LinkExtractor`] turns a listing page into its ordered
//! candidate links and the URL of the next listing page.

use crate::config::HeuristicsConfig;
use crate::crawler::document::{find_official_id, is_pdf_url, CandidateLink};
use crate::crawler::pagination::Pagination;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A hyperlink found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Visible text, whitespace-collapsed
    pub text: String,
    /// Absolute URL
    pub href: Url,
    /// Value of the `rel` attribute, if any
    pub rel: Option<String>,
    /// `aria-label` or `title` attribute, if any
    pub label: Option<String>,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Texts of `h1`/`h2` headings and breadcrumb items, in document order
    pub headings: Vec<String>,

    /// All `<a href>` anchors with resolvable http(s) targets, in document order
    pub anchors: Vec<Anchor>,

    /// `<link rel=... href=...>` elements
    pub head_links: Vec<Anchor>,
}

impl ParsedPage {
    /// Title and headings joined, used to find the page's identifier
    pub fn identifying_text(&self) -> String {
        self.title
            .iter()
            .chain(self.headings.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Parses HTML content and extracts anchors and metadata
///
/// # Link Extraction Rules
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use resolution_harvest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/doc.pdf">PDF</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/list").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.anchors[0].href.as_str(), "https://example.com/doc.pdf");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        headings: extract_headings(&document),
        anchors: extract_elements(&document, "a[href]", base_url),
        head_links: extract_elements(&document, "link[rel][href]", base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn extract_headings(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(
        "h1, h2, .breadcrumb li, nav[aria-label*='breadcrumb'] li, nav[aria-label*='Breadcrumb'] li",
    ) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_elements(document: &Html, selector: &str, base_url: &Url) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let attrs = element.value();
            let href = resolve_link(attrs.attr("href")?, base_url)?;
            let label = attrs
                .attr("aria-label")
                .or_else(|| attrs.attr("title"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());

            Some(Anchor {
                text: element_text(element),
                href,
                rel: attrs.attr("rel").map(|s| s.to_ascii_lowercase()),
                label,
            })
        })
        .collect()
}

/// Collects an element's text with whitespace runs collapsed to one space
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}

/// One visit of a listing page, reconstructed each time and never persisted
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub url: Url,
    pub candidates: Vec<CandidateLink>,
    pub next_page: Option<Url>,
}

/// Turns listing-page HTML into candidate links and the next page URL
pub struct LinkExtractor {
    detail_texts: Vec<String>,
    pagination: Pagination,
}

impl LinkExtractor {
    pub fn new(detail_texts: Vec<String>, pagination: Pagination) -> Self {
        Self {
            detail_texts: detail_texts.iter().map(|t| t.to_lowercase()).collect(),
            pagination,
        }
    }

    pub fn from_config(heuristics: &HeuristicsConfig) -> Self {
        Self::new(
            heuristics.detail_link_texts.clone(),
            Pagination::from_config(heuristics),
        )
    }

    /// Extracts candidates and the next listing page from `html`
    pub fn extract(&self, html: &str, base_url: &Url) -> ListingPage {
        let parsed = parse_html(html, base_url);
        let next_page = self.pagination.next_page(&parsed, base_url);

        ListingPage {
            url: base_url.clone(),
            candidates: self.candidates(&parsed.anchors),
            next_page,
        }
    }

    /// Selects candidate anchors, de-duplicated by URL in first-seen order
    pub fn candidates(&self, anchors: &[Anchor]) -> Vec<CandidateLink> {
        let mut seen = HashSet::new();

        anchors
            .iter()
            .filter(|anchor| self.is_candidate(anchor))
            .filter(|anchor| seen.insert(anchor.href.clone()))
            .map(|anchor| CandidateLink::new(anchor.text.clone(), anchor.href.clone()))
            .collect()
    }

    /// A candidate points at a PDF, carries a detail label, or names an identifier
    fn is_candidate(&self, anchor: &Anchor) -> bool {
        if is_pdf_url(&anchor.href) {
            return true;
        }

        let text = anchor.text.to_lowercase();
        if self.detail_texts.iter().any(|label| text.contains(label)) {
            return true;
        }

        find_official_id(&anchor.text).is_some() || find_official_id(anchor.href.path()).is_some()
    }
}
