use super::ProductSource;
use crate::amazon::{Asin, Parser, PartialProduct, ProductPages, RecordSource};
use crate::error::SourceError;
use async_trait::async_trait;
use tracing::debug;

/// Fetches the public product page and extracts what it can.
pub struct ScrapeSource {
    pages: Box<dyn ProductPages>,
    parser: Parser,
}

impl ScrapeSource {
    pub fn new(pages: impl ProductPages + 'static, parser: Parser) -> Self {
        Self { pages: Box::new(pages), parser }
    }
}

#[async_trait]
impl ProductSource for ScrapeSource {
    fn name(&self) -> &'static str {
        "scrape"
    }

    fn kind(&self) -> RecordSource {
        RecordSource::Scrape
    }

    async fn fetch(&self, asin: &Asin) -> Result<PartialProduct, SourceError> {
        let html = self.pages.product_page(asin).await.map_err(|e| SourceError::transport(&e))?;
        debug!("Fetched {} bytes for {} from {}", html.len(), asin, self.pages.region());
        self.parser.parse_product_page(&html, asin)
    }
}
