//! CSS selectors for Amazon product pages.
//!
//! Each field has an ordered list of candidates; the parser takes the first
//! one that yields plausible text. Update this file when Amazon changes
//! their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Parses each candidate, silently dropping any the `scraper` dialect rejects.
fn candidates(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

/// Selectors for individual product pages (ASIN lookup).
pub mod product {
    use super::*;

    /// Product title on detail page.
    pub static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&[
            "#productTitle",
            "#title span",
            "#title",
            ".product-title-word-break",
            "h1#title",
        ])
    });

    /// Meta tags carrying a title in their `content` attribute.
    pub static TITLE_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&["meta[name='title']", "meta[property='og:title']"])
    });

    /// Main product image; may carry `data-a-dynamic-image` or `data-old-hires`.
    pub static IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&[
            "#landingImage",
            "#imgTagWrapperId img",
            "#imgBlkFront",
            "#ebooksImgBlkFront",
            "#main-image",
            "img[data-a-dynamic-image]",
        ])
    });

    /// Meta tag fallback for the image.
    pub static IMAGE_META: LazyLock<Vec<Selector>> =
        LazyLock::new(|| candidates(&["meta[property='og:image']"]));

    /// Current price on detail page.
    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&[
            "#corePrice_feature_div .a-price .a-offscreen",
            "#corePriceDisplay_desktop_feature_div .a-price .a-offscreen",
            "#priceblock_ourprice",
            "#priceblock_dealprice",
            "#price_inside_buybox",
            "#kindle-price",
            ".a-price .a-offscreen",
        ])
    });

    pub const DYNAMIC_IMAGE_ATTR: &str = "data-a-dynamic-image";
    pub const OLD_HIRES_ATTR: &str = "data-old-hires";
}

/// Selectors and markers for detecting block/captcha pages.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&["form[action*='validateCaptcha']", "img[src*='captcha']"])
    });

    /// Dog page (Amazon's error page). Matched exactly: product images carry
    /// the product title as `alt`.
    pub static DOG_PAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        candidates(&["img[alt='Dogs of Amazon']", "a[href*='cs_503_link']"])
    });

    /// Text fragments only seen on block and robot-check pages.
    pub const BLOCK_MARKERS: &[&str] = &[
        "Robot Check",
        "Enter the characters you see below",
        "Sorry, we just need to make sure you're not a robot",
        "To discuss automated access to Amazon data please contact",
        "api-services-support@amazon.com",
        "/errors/validateCaptcha",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        assert_eq!(product::TITLE.len(), 5);
        assert_eq!(product::TITLE_META.len(), 2);
        assert_eq!(product::IMAGE.len(), 6);
        assert_eq!(product::IMAGE_META.len(), 1);
        assert_eq!(product::PRICE.len(), 7);
        assert_eq!(errors::CAPTCHA.len(), 2);
        assert_eq!(errors::DOG_PAGE.len(), 2);
    }

    #[test]
    fn test_candidates_skip_unsupported() {
        let list = candidates(&["#ok", "span:contains('x')", ".also-ok"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_basic_selector_matching() {
        let html = Html::parse_document(
            r#"<div id="title"><span id="productTitle"> Test Product </span></div>"#,
        );

        let first = product::TITLE.iter().find_map(|sel| html.select(sel).next());
        assert_eq!(first.unwrap().value().id(), Some("productTitle"));
    }
}
