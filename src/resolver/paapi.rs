use super::ProductSource;
use crate::amazon::{Asin, PartialProduct, RecordSource};
use crate::error::SourceError;
use crate::paapi::PaApiClient;
use async_trait::async_trait;

#[async_trait]
impl ProductSource for PaApiClient {
    fn name(&self) -> &'static str {
        "paapi"
    }

    fn kind(&self) -> RecordSource {
        RecordSource::Paapi
    }

    async fn fetch(&self, asin: &Asin) -> Result<PartialProduct, SourceError> {
        self.get_item(asin).await
    }
}
