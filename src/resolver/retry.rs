use super::ProductSource;
use crate::amazon::{Asin, PartialProduct, RecordSource};
use crate::config::RetryPolicy;
use crate::error::SourceError;
use async_trait::async_trait;
use tracing::{info, warn};

/// Wraps a source and repeats a generic-looking success once after a pause.
///
/// Failures are never retried. If the repeat fails, the first result stands.
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ProductSource> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ProductSource> ProductSource for Retrying<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn kind(&self) -> RecordSource {
        self.inner.kind()
    }

    async fn fetch(&self, asin: &Asin) -> Result<PartialProduct, SourceError> {
        let first = self.inner.fetch(asin).await?;

        if !self.policy.enabled || !first.looks_generic(asin) {
            return Ok(first);
        }

        info!(
            "Generic result for {} from {}, retrying in {:?}",
            asin,
            self.inner.name(),
            self.policy.delay()
        );
        tokio::time::sleep(self.policy.delay()).await;

        match self.inner.fetch(asin).await {
            Ok(second) => Ok(second),
            Err(e) => {
                warn!("Retry for {} failed, keeping first result: {}", asin, e);
                Ok(first)
            }
        }
    }
}
