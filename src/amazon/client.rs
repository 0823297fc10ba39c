//! HTTP client for Amazon product pages using wreq for TLS fingerprint emulation.

use crate::amazon::asin::Asin;
use crate::amazon::regions::Region;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Desktop browser user agents rotated across scrape requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Chooses the user agent for each product page request.
pub trait UserAgentSource: Send + Sync {
    fn pick(&self) -> String;
}

/// Uniform random choice from a fixed pool.
pub struct RandomUserAgent {
    pool: Vec<String>,
}

impl RandomUserAgent {
    pub fn new(pool: &[&str]) -> Self {
        Self { pool: pool.iter().map(|s| s.to_string()).collect() }
    }
}

impl Default for RandomUserAgent {
    fn default() -> Self {
        Self::new(USER_AGENTS)
    }
}

impl UserAgentSource for RandomUserAgent {
    fn pick(&self) -> String {
        self.pool
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| USER_AGENTS[0].to_string())
    }
}

/// Always the same user agent.
pub struct FixedUserAgent(pub String);

impl UserAgentSource for FixedUserAgent {
    fn pick(&self) -> String {
        self.0.clone()
    }
}

/// Trait for product page fetching - enables mocking for tests.
#[async_trait]
pub trait ProductPages: Send + Sync {
    /// Fetches a product page by ASIN and returns the HTML.
    async fn product_page(&self, asin: &Asin) -> Result<String>;

    /// Returns the configured region.
    fn region(&self) -> Region;
}

/// Amazon HTTP client with browser impersonation and anti-bot measures.
pub struct AmazonClient {
    client: Client,
    region: Region,
    user_agents: Box<dyn UserAgentSource>,
    base_url: Option<String>,
}

impl AmazonClient {
    /// Creates a new Amazon client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a new Amazon client with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.scrape_timeout_secs))
            .connect_timeout(Duration::from_secs(config.scrape_timeout_secs.min(10)));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build scrape client")?;

        Ok(Self {
            client,
            region: config.region,
            user_agents: Box::new(RandomUserAgent::default()),
            base_url,
        })
    }

    /// Replaces the user-agent source.
    pub fn with_user_agents(mut self, source: impl UserAgentSource + 'static) -> Self {
        self.user_agents = Box::new(source);
        self
    }

    /// Returns the base URL (custom for testing, or region-based for production).
    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.region.base_url())
    }

    /// Performs a GET request with all anti-bot measures.
    async fn get(&self, url: &str) -> Result<String> {
        let user_agent = self.user_agents.pick();
        debug!("GET {} (ua: {})", url, user_agent);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.region.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503) fetching {}", url);
            anyhow::bail!("Rate limited by Amazon (503)");
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        response.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl ProductPages for AmazonClient {
    async fn product_page(&self, asin: &Asin) -> Result<String> {
        let url = format!("{}/dp/{}", self.base_url(), asin);

        info!("Fetching product page: {}", asin);
        self.get(&url).await
    }

    fn region(&self) -> Region {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config { scrape_timeout_secs: 2, ..Config::default() }
    }

    fn asin(s: &str) -> Asin {
        Asin::parse(s).unwrap()
    }

    #[test]
    fn test_random_user_agent_from_pool() {
        let source = RandomUserAgent::default();
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&source.pick().as_str()));
        }

        let empty = RandomUserAgent::new(&[]);
        assert_eq!(empty.pick(), USER_AGENTS[0]);
    }

    #[tokio::test]
    async fn test_product_success() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <span id="productTitle">Amazing Product Title</span>
                <span class="a-price"><span class="a-offscreen">$29.99</span></span>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/dp/B08N5WRWNW"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::with_base_url(&make_test_config(), Some(mock_server.uri())).unwrap();

        let body = client.product_page(&asin("B08N5WRWNW")).await.unwrap();
        assert!(body.contains("Amazing Product Title"));
        assert!(body.contains("$29.99"));
    }

    #[tokio::test]
    async fn test_fixed_user_agent_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B08N5WRWNW"))
            .and(header("user-agent", "pinned-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pinned"))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::with_base_url(&make_test_config(), Some(mock_server.uri()))
            .unwrap()
            .with_user_agents(FixedUserAgent("pinned-agent/1.0".to_string()));

        let body = client.product_page(&asin("B08N5WRWNW")).await.unwrap();
        assert_eq!(body, "pinned");
    }

    #[tokio::test]
    async fn test_rate_limited_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::with_base_url(&make_test_config(), Some(mock_server.uri())).unwrap();

        let err = client.product_page(&asin("B08N5WRWNW")).await.unwrap_err().to_string();
        assert!(err.contains("Rate limited"));
    }

    #[tokio::test]
    async fn test_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B000000000"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::with_base_url(&make_test_config(), Some(mock_server.uri())).unwrap();

        let err = client.product_page(&asin("B000000000")).await.unwrap_err().to_string();
        assert!(err.contains("404"));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let config = Config { scrape_timeout_secs: 1, ..Config::default() };
        let client = AmazonClient::with_base_url(&config, Some(mock_server.uri())).unwrap();

        assert!(client.product_page(&asin("B08N5WRWNW")).await.is_err());
    }

    #[test]
    fn test_base_url_default() {
        let client = AmazonClient::new(&make_test_config()).unwrap();
        assert_eq!(client.base_url(), "https://www.amazon.com");
        assert_eq!(client.region(), Region::Us);
    }

    #[test]
    fn test_different_regions() {
        let mut config = make_test_config();
        config.region = Region::Uk;

        let client = AmazonClient::new(&config).unwrap();
        assert_eq!(client.region(), Region::Uk);
        assert_eq!(client.base_url(), "https://www.amazon.co.uk");
    }
}
