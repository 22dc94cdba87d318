//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with a descriptive user agent and fixed timeout
//! - GET requests for listing pages, detail pages and PDF bodies
//! - HEAD requests to check Content-Type before accepting a PDF URL
//! - Retry logic for transient failures (see [`super::retry`])
//!
//! Pacing between requests is not done here; the coordinator owns the
//! [`super::Pacer`] so the same delay applies to every kind of request.

use crate::config::Config;
use crate::crawler::retry::{classify_error, classify_status, retry_after, FailureType, RetryPolicy};
use crate::{FetchError, FetchResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use std::time::Duration;
use url::Url;

/// A fetched HTML (or text) page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value (empty if absent)
    pub content_type: String,
    /// Page body content
    pub body: String,
}

/// Response metadata from a HEAD request
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub final_url: Url,
    pub content_type: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use resolution_harvest::config::UserAgentConfig;
/// use resolution_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(25)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &crate::config::UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_max_idle_per_host(4)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless HTTP client with bounded retries
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Builds the client and retry policy from the crawler configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.timeout())?;
        let retry = RetryPolicy::new(
            config.crawler.max_attempts,
            config.crawler.backoff_base(),
            config.crawler.backoff_max(),
        );
        Ok(Self::new(client, retry))
    }

    /// Sends a GET and returns the successful response with its body unread
    pub async fn get(&self, url: &Url) -> FetchResult<Response> {
        self.send_with_retry(Method::GET, url).await
    }

    /// Sends a HEAD, following redirects, and returns the response metadata
    pub async fn head(&self, url: &Url) -> FetchResult<ResponseMeta> {
        let response = self.send_with_retry(Method::HEAD, url).await?;
        Ok(ResponseMeta {
            final_url: response.url().clone(),
            content_type: content_type_of(&response),
        })
    }

    /// Fetches a page and reads its body as text
    pub async fn get_page(&self, url: &Url) -> FetchResult<FetchedPage> {
        let response = self.get(url).await?;
        read_page(response).await
    }

    /// Sends a request, retrying transient failures per the retry policy
    ///
    /// # Retry Logic
    ///
    /// Connection errors, timeouts, HTTP 429 and 5xx are retried with
    /// capped exponential backoff. A `Retry-After` header on a retryable
    /// response lengthens the wait up to the policy's cap. Every other
    /// failure is returned at once.
    async fn send_with_retry(&self, method: Method, url: &Url) -> FetchResult<Response> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let (message, hinted_wait) =
                match self.client.request(method.clone(), url.clone()).send().await {
                    Ok(response) if response.status().is_success() => return Ok(response),
                    Ok(response) => {
                        let status = response.status();
                        if classify_status(status) == FailureType::Permanent {
                            return Err(FetchError::Status {
                                url: url.to_string(),
                                status: status.as_u16(),
                            });
                        }
                        (format!("HTTP {}", status.as_u16()), retry_after(response.headers()))
                    }
                    Err(e) => {
                        if classify_error(&e) == FailureType::Permanent {
                            return Err(FetchError::Request {
                                url: url.to_string(),
                                message: e.to_string(),
                            });
                        }
                        (e.to_string(), None)
                    }
                };

            let Some(backoff) = self.retry.should_retry(FailureType::Transient, attempt) else {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    message,
                });
            };

            let wait = hinted_wait
                .map(|hint| hint.max(backoff).min(self.retry.max_delay()))
                .unwrap_or(backoff);

            tracing::warn!(
                "{} {} failed ({}), retrying in {:?} (attempt {}/{})",
                method,
                url,
                message,
                wait,
                attempt + 1,
                self.retry.max_attempts()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Reads a successful response into a [`FetchedPage`]
pub async fn read_page(response: Response) -> FetchResult<FetchedPage> {
    let final_url = response.url().clone();
    let status_code = response.status().as_u16();
    let content_type = content_type_of(&response);

    let body = response.text().await.map_err(|e| FetchError::Request {
        url: final_url.to_string(),
        message: format!("failed to read body: {}", e),
    })?;

    Ok(FetchedPage {
        final_url,
        status_code,
        content_type,
        body,
    })
}

/// Returns the Content-Type header value, or an empty string
pub fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Returns true if a Content-Type header value denotes a PDF
pub fn is_pdf_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/pdf" || mime.ends_with("/pdf")
}
