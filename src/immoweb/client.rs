//! HTTP client for Immoweb page loads using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::ScrapeError;
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Abstract page-fetch capability.
///
/// The pipeline only needs "give me the document behind this URL"; whether
/// that is a static HTML fetch or a rendering browser session is an
/// implementation concern, which also makes the whole pipeline mockable.
#[async_trait]
pub trait FetchPage: Send + Sync {
    /// Fetches the page at `url` and returns its HTML.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Static-fetch implementation with browser impersonation and request pacing.
///
/// Every request is preceded by the configured pacing delay plus random
/// jitter; that is the system's only rate-limit control toward the site.
pub struct ImmowebClient {
    client: Client,
    user_agent: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl ImmowebClient {
    /// Creates a new client from the configuration.
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ScrapeError::transport(&config.base_url, e))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Waits the pacing delay plus random jitter.
    async fn pace(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total = self.delay_ms + jitter;
        debug!("Pacing delay {}ms", total);
        tokio::time::sleep(Duration::from_millis(total)).await;
    }

    /// Updates the pacing settings.
    pub fn set_delay(&mut self, delay_ms: u64, jitter_ms: u64) {
        self.delay_ms = delay_ms;
        self.delay_jitter_ms = jitter_ms;
    }
}

#[async_trait]
impl FetchPage for ImmowebClient {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.pace().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-GB,en;q=0.9,nl;q=0.8,fr;q=0.7")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider increasing the pacing delay.");
            return Err(ScrapeError::transport(url, "rate limited (503)"));
        }

        if !status.is_success() {
            return Err(ScrapeError::transport(url, format!("status {}", status)));
        }

        response.text().await.map_err(|e| ScrapeError::transport(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config(base_url: &str) -> Config {
        Config { base_url: base_url.to_string(), delay_ms: 0, delay_jitter_ms: 0, ..Config::default() }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/en/classified/123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>flat</html>"))
            .mount(&server)
            .await;

        let client = ImmowebClient::new(&make_test_config(&server.uri())).unwrap();
        let body = client.fetch(&format!("{}/en/classified/123", server.uri())).await.unwrap();
        assert!(body.contains("flat"));
    }

    #[tokio::test]
    async fn test_fetch_rate_limited_503() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ImmowebClient::new(&make_test_config(&server.uri())).unwrap();
        let err = client.fetch(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ImmowebClient::new(&make_test_config(&server.uri())).unwrap();
        let err = client.fetch(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let client = ImmowebClient::new(&make_test_config(&server.uri())).unwrap();
        let body = client.fetch(&server.uri()).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_set_delay() {
        let mut client = ImmowebClient::new(&make_test_config("http://localhost")).unwrap();
        client.set_delay(1000, 500);
        assert_eq!(client.delay_ms, 1000);
        assert_eq!(client.delay_jitter_ms, 500);
    }
}
