//! Product record handed to the page renderer, and the partial data sources produce.

use crate::amazon::asin::Asin;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title prefix used when no real title could be obtained.
pub const FALLBACK_TITLE_PREFIX: &str = "Amazon Product";

/// Returns the synthesized title for `asin`.
pub fn fallback_title(asin: &Asin) -> String {
    format!("{} {}", FALLBACK_TITLE_PREFIX, asin)
}

/// Returns the deterministic image URL derived from `asin`.
pub fn fallback_image(asin: &Asin) -> String {
    format!("https://images-na.ssl-images-amazon.com/images/P/{}.01.L.jpg", asin)
}

/// Where the data in a [`ProductRecord`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Product Advertising API
    Paapi,
    /// Product page scrape
    Scrape,
    /// Synthesized placeholder data
    Fallback,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::Paapi => write!(f, "paapi"),
            RecordSource::Scrape => write!(f, "scrape"),
            RecordSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Whatever a single source managed to obtain for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialProduct {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
}

impl PartialProduct {
    /// Returns true if nothing usable was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.image.is_none() && self.price.is_none()
    }

    /// Returns true if the title is missing or is a placeholder for `asin`.
    pub fn has_generic_title(&self, asin: &Asin) -> bool {
        match self.title.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(title) => {
                title.eq_ignore_ascii_case(&fallback_title(asin))
                    || title.starts_with(FALLBACK_TITLE_PREFIX)
                    || title.eq_ignore_ascii_case("Amazon.com")
            }
        }
    }

    /// Returns true if the result looks like a placeholder worth another attempt.
    pub fn looks_generic(&self, asin: &Asin) -> bool {
        self.has_generic_title(asin) || self.image.as_deref().is_none_or(str::is_empty)
    }
}

/// Fully populated product data. Title and image are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub asin: Asin,
    pub title: String,
    pub image: String,
    /// Display price as shown by Amazon, empty when unknown.
    pub price: String,
    pub source: RecordSource,
}

impl ProductRecord {
    /// Completes `partial` with synthesized values for anything missing.
    pub fn from_partial(asin: &Asin, partial: PartialProduct, source: RecordSource) -> Self {
        let title = partial
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback_title(asin));

        let image = partial
            .image
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| fallback_image(asin));

        let price = partial.price.map(|p| p.trim().to_string()).unwrap_or_default();

        Self { asin: asin.clone(), title, image, price, source }
    }

    /// Record made entirely of placeholder data.
    pub fn fallback(asin: &Asin) -> Self {
        Self::from_partial(asin, PartialProduct::default(), RecordSource::Fallback)
    }

    /// Returns true if the title is the synthesized placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.title == fallback_title(&self.asin)
    }
}
