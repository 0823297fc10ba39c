//! Product resolution through an ordered chain of fallible sources.
//!
//! Sources are tried in order; the first success wins. Whatever is still
//! missing afterwards is synthesized, so resolution itself never fails.

pub mod paapi;
pub mod retry;
pub mod scrape;

use crate::amazon::{AmazonClient, Asin, Parser, PartialProduct, ProductRecord, RecordSource};
use crate::config::Config;
use crate::error::SourceError;
use crate::paapi::PaApiClient;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use retry::Retrying;
pub use scrape::ScrapeSource;

/// One way of obtaining product data.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Tag recorded on products this source resolved.
    fn kind(&self) -> RecordSource;

    /// Fetches whatever this source can find for `asin`.
    async fn fetch(&self, asin: &Asin) -> Result<PartialProduct, SourceError>;
}

/// Walks its sources in order and always yields a renderable record.
#[derive(Default)]
pub struct ProductResolver {
    sources: Vec<Box<dyn ProductSource>>,
}

impl ProductResolver {
    /// Creates a resolver with no sources; it only produces placeholders.
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Creates a resolver over an already ordered list of sources.
    pub fn from_sources(sources: Vec<Box<dyn ProductSource>>) -> Self {
        Self { sources }
    }

    /// Appends a source to the chain.
    pub fn add(&mut self, source: impl ProductSource + 'static) -> &mut Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Builder-style variant of [`ProductResolver::add`].
    pub fn with_source(mut self, source: impl ProductSource + 'static) -> Self {
        self.add(source);
        self
    }

    /// Builds the standard chain: PA-API when credentials exist, then scraping.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut resolver = Self::new();

        match config.credentials() {
            Some(credentials) => {
                resolver.add(PaApiClient::new(config, credentials)?);
            }
            None => debug!("PA-API credentials not configured, scraping only"),
        }

        let scrape = ScrapeSource::new(AmazonClient::new(config)?, Parser::new(config.min_page_len));
        resolver.add(Retrying::new(scrape, config.retry));

        Ok(resolver)
    }

    /// Resolves `asin`, falling back to synthesized data when every source fails.
    pub async fn resolve(&self, asin: &Asin) -> ProductRecord {
        for source in &self.sources {
            match source.fetch(asin).await {
                Ok(partial) => {
                    let kind = if partial.is_empty() { RecordSource::Fallback } else { source.kind() };
                    let record = ProductRecord::from_partial(asin, partial, kind);
                    info!("Resolved {} via {} (placeholder: {})", asin, source.name(), record.is_placeholder());
                    return record;
                }
                Err(e) => warn!("Source {} failed for {}: {}", source.name(), asin, e),
            }
        }

        info!("All sources failed for {}, using placeholder data", asin);
        ProductRecord::fallback(asin)
    }

    /// Names of the configured sources, in order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
