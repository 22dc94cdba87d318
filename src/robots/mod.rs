//! Robots.txt handling module
//!
//! The catalog lives on a single host, so robots.txt is fetched once at the
//! start of a run and consulted before every listing page.

mod parser;

pub use parser::RobotsRules;

use crate::crawler::{HttpClient, Pacer};
use url::Url;

/// Fetches robots.txt for the host of `start_url`
///
/// Any failure (missing file, HTTP error, unreadable body) yields rules
/// that allow everything.
pub async fn fetch_robots(client: &HttpClient, start_url: &Url, pacer: &mut Pacer) -> RobotsRules {
    let robots_url = match start_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", start_url, e);
            return RobotsRules::allow_all();
        }
    };

    pacer.wait().await;
    match client.get_page(&robots_url).await {
        Ok(page) => {
            tracing::debug!("Fetched {} ({} bytes)", robots_url, page.body.len());
            RobotsRules::from_content(&page.body)
        }
        Err(e) => {
            tracing::debug!("No usable robots.txt at {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{build_http_client, RetryPolicy};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        let client = build_http_client(
            &crate::config::UserAgentConfig::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        HttpClient::new(
            client,
            RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_fetch_robots() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
            .expect(1)
            .mount(&server)
            .await;

        let start = Url::parse(&format!("{}/resoluciones", server.uri())).unwrap();
        let mut pacer = Pacer::new(Duration::ZERO);
        let rules = fetch_robots(&client(), &start, &mut pacer).await;

        assert!(rules.allows(start.as_str(), "Resolution-Harvest"));
        assert!(!rules.allows(&format!("{}/private/x", server.uri()), "Resolution-Harvest"));
        assert_eq!(pacer.requests(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let start = Url::parse(&format!("{}/resoluciones", server.uri())).unwrap();
        let rules = fetch_robots(&client(), &start, &mut Pacer::new(Duration::ZERO)).await;
        assert!(rules.allows(start.as_str(), "Resolution-Harvest"));
    }
}
