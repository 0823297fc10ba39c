//! Product image URL selection and high-resolution rewriting.
//!
//! Best effort: Amazon serves many URL shapes and not all of them carry a
//! size token that can be rewritten.

use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Size tag every rewritten URL ends up with.
pub const HIGH_RES_TAG: &str = "._SL1500_.";

/// Trailing size token such as `._AC_SX300_SY300_QL70_ML2_.jpg` or `._SL500_.png`.
static SIZE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\._[A-Z0-9_,-]+_\.(jpe?g|png|gif|webp)$").expect("valid size token regex")
});

/// Picks the largest entry of a `data-a-dynamic-image` JSON blob.
///
/// The blob maps URLs to `[width, height]`.
pub fn largest_dynamic_image(json: &str) -> Option<String> {
    let sizes: HashMap<String, Vec<u64>> = serde_json::from_str(json).ok()?;

    sizes
        .into_iter()
        .filter(|(url, _)| is_usable(url))
        .max_by(|(url_a, a), (url_b, b)| area(a).cmp(&area(b)).then_with(|| url_b.cmp(url_a)))
        .map(|(url, _)| url)
}

fn area(dims: &[u64]) -> u64 {
    match dims {
        [w, h, ..] => w.saturating_mul(*h),
        [w] => *w,
        [] => 0,
    }
}

/// Returns true for URLs worth showing (not data URIs or blank strings).
pub fn is_usable(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.starts_with("data:") && (url.starts_with("http") || url.starts_with("//"))
}

/// Rewrites a known size token to the high-resolution tag.
///
/// URLs without a recognised token are returned unchanged.
pub fn to_high_res(url: &str) -> String {
    let url = url.trim();
    let url = if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    };

    SIZE_TOKEN.replace(&url, format!("{}$1", HIGH_RES_TAG).as_str()).into_owned()
}

/// Chooses the best image from the candidates found on a product page.
///
/// Preference: dynamic image JSON, then `data-old-hires`, then `src`.
pub fn normalize(dynamic_json: Option<&str>, old_hires: Option<&str>, src: Option<&str>) -> Option<String> {
    dynamic_json
        .and_then(largest_dynamic_image)
        .or_else(|| old_hires.filter(|u| is_usable(u)).map(String::from))
        .or_else(|| src.filter(|u| is_usable(u)).map(String::from))
        .map(|url| to_high_res(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_dynamic_image() {
        let json = r#"{
            "https://m.media-amazon.com/images/I/small._AC_SX300_.jpg": [300, 300],
            "https://m.media-amazon.com/images/I/large._AC_SX679_.jpg": [679, 679],
            "https://m.media-amazon.com/images/I/mid._AC_SX450_.jpg": [450, 450]
        }"#;
        assert_eq!(
            largest_dynamic_image(json).as_deref(),
            Some("https://m.media-amazon.com/images/I/large._AC_SX679_.jpg")
        );
    }

    #[test]
    fn test_largest_dynamic_image_invalid() {
        assert!(largest_dynamic_image("not json").is_none());
        assert!(largest_dynamic_image("{}").is_none());
        assert!(largest_dynamic_image(r#"{"data:image/gif;base64,xyz": [1, 1]}"#).is_none());
    }

    #[test]
    fn test_to_high_res() {
        assert_eq!(
            to_high_res("https://m.media-amazon.com/images/I/71abc._AC_SX679_.jpg"),
            "https://m.media-amazon.com/images/I/71abc._SL1500_.jpg"
        );
        assert_eq!(
            to_high_res("https://m.media-amazon.com/images/I/71abc._AC_SY300_SX300_QL70_ML2_.png"),
            "https://m.media-amazon.com/images/I/71abc._SL1500_.png"
        );
        assert_eq!(
            to_high_res("https://images-na.ssl-images-amazon.com/images/I/41x._SL500_.jpg"),
            "https://images-na.ssl-images-amazon.com/images/I/41x._SL1500_.jpg"
        );
    }

    #[test]
    fn test_to_high_res_leaves_unknown_shapes() {
        let url = "https://m.media-amazon.com/images/I/71abc.jpg";
        assert_eq!(to_high_res(url), url);
    }

    #[test]
    fn test_to_high_res_protocol_relative() {
        assert_eq!(
            to_high_res("//m.media-amazon.com/images/I/71abc._SX38_.jpg"),
            "https://m.media-amazon.com/images/I/71abc._SL1500_.jpg"
        );
    }

    #[test]
    fn test_normalize_preference() {
        let dynamic = r#"{"https://m.media-amazon.com/images/I/a._AC_SX500_.jpg": [500, 500]}"#;
        let hires = "https://m.media-amazon.com/images/I/b._AC_SL1000_.jpg";
        let src = "https://m.media-amazon.com/images/I/c._AC_SX300_.jpg";

        assert_eq!(
            normalize(Some(dynamic), Some(hires), Some(src)).unwrap(),
            "https://m.media-amazon.com/images/I/a._SL1500_.jpg"
        );
        assert_eq!(
            normalize(Some("garbage"), Some(hires), Some(src)).unwrap(),
            "https://m.media-amazon.com/images/I/b._SL1500_.jpg"
        );
        assert_eq!(
            normalize(None, Some(""), Some(src)).unwrap(),
            "https://m.media-amazon.com/images/I/c._SL1500_.jpg"
        );
        assert!(normalize(None, None, Some("data:image/gif;base64,R0lGOD")).is_none());
        assert!(normalize(None, None, None).is_none());
    }
}
