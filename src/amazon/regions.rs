//! Amazon marketplaces with their storefront domains and PA-API endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported Amazon marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Ca,
    Au,
    Jp,
    In,
    Br,
    Mx,
    Nl,
    Se,
    Pl,
}

impl Region {
    /// Returns the Amazon domain for this region.
    pub fn domain(&self) -> &'static str {
        match self {
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::De => "amazon.de",
            Region::Fr => "amazon.fr",
            Region::Es => "amazon.es",
            Region::It => "amazon.it",
            Region::Ca => "amazon.ca",
            Region::Au => "amazon.com.au",
            Region::Jp => "amazon.co.jp",
            Region::In => "amazon.in",
            Region::Br => "amazon.com.br",
            Region::Mx => "amazon.com.mx",
            Region::Nl => "amazon.nl",
            Region::Se => "amazon.se",
            Region::Pl => "amazon.pl",
        }
    }

    /// Returns the base URL for this region.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the marketplace name PA-API expects (`www.amazon.com`).
    pub fn marketplace(&self) -> String {
        format!("www.{}", self.domain())
    }

    /// Returns the PA-API host for this marketplace.
    pub fn paapi_host(&self) -> String {
        format!("webservices.{}", self.domain())
    }

    /// Returns the AWS region PA-API requests for this marketplace are signed for.
    pub fn paapi_region(&self) -> &'static str {
        match self {
            Region::Us | Region::Ca | Region::Mx | Region::Br => "us-east-1",
            Region::Uk
            | Region::De
            | Region::Fr
            | Region::Es
            | Region::It
            | Region::In
            | Region::Nl
            | Region::Se
            | Region::Pl => "eu-west-1",
            Region::Jp | Region::Au => "us-west-2",
        }
    }

    /// Returns the Accept-Language header value for this region.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Region::Us | Region::Ca | Region::Au => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9",
            Region::De => "de-DE,de;q=0.9,en;q=0.8",
            Region::Fr => "fr-FR,fr;q=0.9,en;q=0.8",
            Region::Es | Region::Mx => "es-ES,es;q=0.9,en;q=0.8",
            Region::It => "it-IT,it;q=0.9,en;q=0.8",
            Region::Jp => "ja-JP,ja;q=0.9,en;q=0.8",
            Region::In => "en-IN,en;q=0.9,hi;q=0.8",
            Region::Br => "pt-BR,pt;q=0.9,en;q=0.8",
            Region::Nl => "nl-NL,nl;q=0.9,en;q=0.8",
            Region::Se => "sv-SE,sv;q=0.9,en;q=0.8",
            Region::Pl => "pl-PL,pl;q=0.9,en;q=0.8",
        }
    }

    /// Returns all supported regions.
    pub fn all() -> &'static [Region] {
        &[
            Region::Us,
            Region::Uk,
            Region::De,
            Region::Fr,
            Region::Es,
            Region::It,
            Region::Ca,
            Region::Au,
            Region::Jp,
            Region::In,
            Region::Br,
            Region::Mx,
            Region::Nl,
            Region::Se,
            Region::Pl,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Region::Us => "us",
            Region::Uk => "uk",
            Region::De => "de",
            Region::Fr => "fr",
            Region::Es => "es",
            Region::It => "it",
            Region::Ca => "ca",
            Region::Au => "au",
            Region::Jp => "jp",
            Region::In => "in",
            Region::Br => "br",
            Region::Mx => "mx",
            Region::Nl => "nl",
            Region::Se => "se",
            Region::Pl => "pl",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "us" | "usa" | "united states" => Ok(Region::Us),
            "uk" | "gb" | "united kingdom" => Ok(Region::Uk),
            "de" | "germany" => Ok(Region::De),
            "fr" | "france" => Ok(Region::Fr),
            "es" | "spain" => Ok(Region::Es),
            "it" | "italy" => Ok(Region::It),
            "ca" | "canada" => Ok(Region::Ca),
            "au" | "australia" => Ok(Region::Au),
            "jp" | "japan" => Ok(Region::Jp),
            "in" | "india" => Ok(Region::In),
            "br" | "brazil" => Ok(Region::Br),
            "mx" | "mexico" => Ok(Region::Mx),
            "nl" | "netherlands" => Ok(Region::Nl),
            "se" | "sweden" => Ok(Region::Se),
            "pl" | "poland" => Ok(Region::Pl),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

/// Returned when a marketplace code or alias is not recognised.
#[derive(Debug, Clone, Error)]
#[error("Unknown region '{0}'. Valid regions: us, uk, de, fr, es, it, ca, au, jp, in, br, mx, nl, se, pl")]
pub struct RegionParseError(String);
