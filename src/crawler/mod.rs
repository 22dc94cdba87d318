//! Crawler module for catalog walking and document resolution
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing, candidate extraction and pagination
//! - Resolution of candidates to PDF URLs
//! - Request pacing
//! - Overall crawl coordination

mod coordinator;
mod document;
mod fetcher;
mod pacer;
mod pagination;
mod parser;
mod resolver;
mod retry;

pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use document::{find_official_id, is_pdf_url, CandidateLink, LinkKind, ResolvedDocument};
pub use fetcher::{
    build_http_client, content_type_of, is_pdf_content_type, read_page, FetchedPage, HttpClient,
    ResponseMeta,
};
pub use pacer::Pacer;
pub use pagination::{
    page_number, NextLabelStrategy, NextPageStrategy, NumberedPageStrategy, Pagination,
    RelNextStrategy,
};
pub use parser::{parse_html, Anchor, LinkExtractor, ListingPage, ParsedPage};
pub use resolver::{select_pdf_anchor, LinkResolver, ResolveError};
pub use retry::{FailureType, RetryPolicy};
