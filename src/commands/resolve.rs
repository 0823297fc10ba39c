//! One-shot resolution of a link or ASIN from the command line.

use crate::amazon::{Asin, AsinExtractor};
use crate::config::Config;
use crate::format::Formatter;
use crate::render::PageRenderer;
use crate::resolver::ProductResolver;
use anyhow::{Context, Result};
use tracing::info;

/// Executes a lookup for an ASIN, path or product URL.
pub struct ResolveCommand {
    config: Config,
    html: bool,
}

impl ResolveCommand {
    pub fn new(config: Config) -> Self {
        Self { config, html: false }
    }

    /// Print the rendered interstitial instead of the formatted record.
    pub fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    pub async fn execute(&self, input: &str) -> Result<String> {
        let resolver =
            ProductResolver::from_config(&self.config).context("Failed to build resolver")?;

        self.execute_with_resolver(&resolver, input).await
    }

    /// Resolves with a provided resolver (for testing).
    pub async fn execute_with_resolver(
        &self,
        resolver: &ProductResolver,
        input: &str,
    ) -> Result<String> {
        let asin = self.extract(input)?;
        info!("Looking up product: {}", asin);

        let record = resolver.resolve(&asin).await;
        let renderer = PageRenderer::new(
            self.config.region,
            self.config.partner_tag.clone(),
            self.config.redirect_delay_secs,
        );

        if self.html {
            return Ok(renderer.render(&record));
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_record(&record, &renderer.affiliate_url(&asin)))
    }

    fn extract(&self, input: &str) -> Result<Asin> {
        let input = input.trim();
        let extractor =
            AsinExtractor::new(self.config.short_links().context("Invalid short link table")?);

        extractor
            .from_url(input)
            .or_else(|| AsinExtractor::from_path(input))
            .with_context(|| format!("No ASIN found in '{}'", input))
    }
}
