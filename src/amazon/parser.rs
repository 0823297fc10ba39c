//! HTML parser for Amazon product pages.

use crate::amazon::asin::Asin;
use crate::amazon::image;
use crate::amazon::models::PartialProduct;
use crate::amazon::selectors::{errors, product};
use crate::error::SourceError;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// Default minimum body length below which a page is treated as blocked.
pub const DEFAULT_MIN_PAGE_LEN: usize = 2000;

/// Parser for Amazon product pages.
pub struct Parser {
    min_page_len: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PAGE_LEN)
    }
}

impl Parser {
    /// Creates a parser that rejects bodies shorter than `min_page_len` bytes.
    pub fn new(min_page_len: usize) -> Self {
        Self { min_page_len }
    }

    /// Parses a product page into whatever fields could be found.
    ///
    /// Block pages are an error; a real page with missing fields is not.
    pub fn parse_product_page(&self, html: &str, asin: &Asin) -> Result<PartialProduct, SourceError> {
        self.check_body(html)?;

        let document = Html::parse_document(html);
        self.check_for_errors(&document)?;

        let partial = PartialProduct {
            title: self.parse_title(&document),
            image: self.parse_image(&document),
            price: self.parse_price(&document),
        };

        debug!(
            "Parsed {}: title={} image={} price={}",
            asin,
            partial.title.is_some(),
            partial.image.is_some(),
            partial.price.is_some()
        );

        Ok(partial)
    }

    /// Rejects short bodies and pages containing block markers.
    fn check_body(&self, html: &str) -> Result<(), SourceError> {
        if html.len() < self.min_page_len {
            return Err(SourceError::Blocked(format!(
                "body too short ({} < {} bytes)",
                html.len(),
                self.min_page_len
            )));
        }

        if let Some(marker) = errors::BLOCK_MARKERS.iter().find(|m| html.contains(*m)) {
            return Err(SourceError::Blocked(format!("marker '{}'", marker)));
        }

        Ok(())
    }

    /// Checks for CAPTCHA and dog pages.
    fn check_for_errors(&self, document: &Html) -> Result<(), SourceError> {
        if first_match(document, &errors::CAPTCHA).is_some() {
            return Err(SourceError::Blocked("CAPTCHA detected".to_string()));
        }

        if first_match(document, &errors::DOG_PAGE).is_some() {
            return Err(SourceError::Blocked("Amazon error page detected (503)".to_string()));
        }

        Ok(())
    }

    fn parse_title(&self, document: &Html) -> Option<String> {
        let from_text = product::TITLE.iter().find_map(|sel| {
            document.select(sel).map(element_text).find(|t| is_plausible_title(t))
        });

        from_text.or_else(|| {
            product::TITLE_META.iter().find_map(|sel| {
                document
                    .select(sel)
                    .filter_map(|e| e.value().attr("content"))
                    .map(clean_meta_title)
                    .find(|t| is_plausible_title(t))
            })
        })
    }

    fn parse_image(&self, document: &Html) -> Option<String> {
        for sel in product::IMAGE.iter() {
            for element in document.select(sel) {
                let attrs = element.value();
                if let Some(url) = image::normalize(
                    attrs.attr(product::DYNAMIC_IMAGE_ATTR),
                    attrs.attr(product::OLD_HIRES_ATTR),
                    attrs.attr("src"),
                ) {
                    trace!("Image from selector candidate: {}", url);
                    return Some(url);
                }
            }
        }

        product::IMAGE_META.iter().find_map(|sel| {
            document
                .select(sel)
                .filter_map(|e| e.value().attr("content"))
                .find(|u| image::is_usable(u))
                .map(image::to_high_res)
        })
    }

    fn parse_price(&self, document: &Html) -> Option<String> {
        product::PRICE
            .iter()
            .find_map(|sel| document.select(sel).map(element_text).find(|t| is_plausible_price(t)))
    }
}

fn first_match<'a>(document: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|sel| document.select(sel).next())
}

/// Element text with whitespace runs collapsed.
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_meta_title(content: &str) -> String {
    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    content
        .strip_prefix("Amazon.com: ")
        .or_else(|| content.strip_prefix("Amazon.com : "))
        .unwrap_or(&content)
        .to_string()
}

fn is_plausible_title(text: &str) -> bool {
    let len = text.chars().count();
    (3..=500).contains(&len) && !text.eq_ignore_ascii_case("Amazon.com")
}

fn is_plausible_price(text: &str) -> bool {
    !text.is_empty() && text.len() <= 40 && text.chars().any(|c| c.is_ascii_digit())
}
