//! ASIN type and extraction from inbound paths and product URLs.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, trace};

/// Strict ASIN shape, case-insensitive.
static ASIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9]{10}$").expect("valid ASIN regex"));

/// URL shapes that carry an ASIN, tried in order.
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)/dp/([A-Z0-9]{10})",
        r"(?i)/product/([A-Z0-9]{10})",
        r"(?i)/gp/product/([A-Z0-9]{10})",
        r"(?i)asin=([A-Z0-9]{10})",
        r"(?i)/([A-Z0-9]{10})(?:/|\?|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid URL pattern"))
    .collect()
});

/// Amazon Standard Identification Number.
///
/// Always 10 ASCII alphanumerics. The token keeps the casing it was
/// extracted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asin(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ASIN format: '{0}'. ASIN should be 10 alphanumeric characters.")]
pub struct InvalidAsin(pub String);

impl Asin {
    /// Validates `candidate` against the strict ASIN pattern.
    pub fn parse(candidate: &str) -> Result<Self, InvalidAsin> {
        if ASIN_PATTERN.is_match(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(InvalidAsin(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Asin {
    type Err = InvalidAsin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Asin {
    type Error = InvalidAsin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Asin> for String {
    fn from(asin: Asin) -> Self {
        asin.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known short links (e.g. `amzn.to/...`) mapped to the product they point at.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ShortLinks {
    entries: Vec<(String, Asin)>,
}

impl ShortLinks {
    /// Builds the table, rejecting entries whose target is not a valid ASIN.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, InvalidAsin> {
        let entries = map
            .iter()
            .filter(|(link, _)| !link.is_empty())
            .map(|(link, asin)| Asin::parse(asin).map(|asin| (link.clone(), asin)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// The built-in table.
    pub fn defaults() -> BTreeMap<String, String> {
        BTreeMap::from([("amzn.to/468mKVM".to_string(), "B09P21T2GC".to_string())])
    }

    /// Returns the ASIN of the first short link contained in `text`.
    pub fn lookup(&self, text: &str) -> Option<&Asin> {
        self.entries.iter().find(|(link, _)| text.contains(link.as_str())).map(|(_, asin)| asin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pulls an ASIN out of an inbound path segment or `url` parameter.
#[derive(Debug, Clone, Default)]
pub struct AsinExtractor {
    short_links: ShortLinks,
}

impl AsinExtractor {
    pub fn new(short_links: ShortLinks) -> Self {
        Self { short_links }
    }

    /// Extracts an ASIN, preferring the URL parameter when one is present.
    pub fn extract(&self, path: Option<&str>, url: Option<&str>) -> Option<Asin> {
        match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => self.from_url(url),
            None => path.and_then(Self::from_path),
        }
    }

    /// Searches a (possibly percent-encoded) product URL or short link.
    pub fn from_url(&self, url: &str) -> Option<Asin> {
        let decoded = urlencoding::decode(url).map(|d| d.into_owned()).unwrap_or_else(|_| url.to_string());

        if let Some(asin) = self.short_links.lookup(&decoded) {
            debug!("Short link matched in {} -> {}", decoded, asin);
            return Some(asin.clone());
        }

        for pattern in URL_PATTERNS.iter() {
            for caps in pattern.captures_iter(&decoded) {
                let Some(candidate) = caps.get(1) else { continue };
                if let Ok(asin) = Asin::parse(candidate.as_str()) {
                    trace!("Pattern {} matched {}", pattern.as_str(), asin);
                    return Some(asin);
                }
            }
        }

        debug!("No ASIN found in url parameter: {}", decoded);
        None
    }

    /// Treats the first path segment as a bare ASIN.
    pub fn from_path(path: &str) -> Option<Asin> {
        let segment = path.trim_start_matches('/').split('/').next()?;
        if segment.len() != 10 {
            return None;
        }
        Asin::parse(segment).ok()
    }
}
