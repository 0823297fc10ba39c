//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::asin::{InvalidAsin, ShortLinks};
use crate::amazon::regions::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon marketplace
    #[serde(default)]
    pub region: Region,

    /// Proxy URL for scrape requests (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Associates partner tag appended to outbound links
    #[serde(default = "default_partner_tag")]
    pub partner_tag: String,

    /// PA-API access key
    #[serde(default)]
    pub access_key: Option<String>,

    /// PA-API secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Timeout for PA-API calls in seconds
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Timeout for product page requests in seconds
    #[serde(default = "default_scrape_timeout_secs")]
    pub scrape_timeout_secs: u64,

    /// Product pages shorter than this are treated as block pages
    #[serde(default = "default_min_page_len")]
    pub min_page_len: usize,

    /// Second scrape attempt when the first one looks like a placeholder
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Countdown before the interstitial navigates to Amazon
    #[serde(default = "default_redirect_delay_secs")]
    pub redirect_delay_secs: u64,

    /// Upper bound for resolving one inbound request
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// Known short links mapped to ASINs
    #[serde(default = "ShortLinks::defaults")]
    pub short_links: BTreeMap<String, String>,

    /// Output format for the `resolve` command
    #[serde(default)]
    pub format: OutputFormat,
}

/// Whether and how long to wait before re-scraping a placeholder-looking page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_retry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self { enabled: false, delay_ms: 0 }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { enabled: default_retry_enabled(), delay_ms: default_retry_delay_ms() }
    }
}

/// PA-API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_partner_tag() -> String {
    "amzredirect-20".to_string()
}

fn default_api_timeout_secs() -> u64 {
    10
}

fn default_scrape_timeout_secs() -> u64 {
    10
}

fn default_min_page_len() -> usize {
    crate::amazon::parser::DEFAULT_MIN_PAGE_LEN
}

fn default_retry_enabled() -> bool {
    true
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_redirect_delay_secs() -> u64 {
    5
}

fn default_request_deadline_secs() -> u64 {
    25
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::Us,
            proxy: None,
            bind_addr: default_bind_addr(),
            partner_tag: default_partner_tag(),
            access_key: None,
            secret_key: None,
            api_timeout_secs: default_api_timeout_secs(),
            scrape_timeout_secs: default_scrape_timeout_secs(),
            min_page_len: default_min_page_len(),
            retry: RetryPolicy::default(),
            redirect_delay_secs: default_redirect_delay_secs(),
            request_deadline_secs: default_request_deadline_secs(),
            short_links: ShortLinks::defaults(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-redirect").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(region) = var("AMZ_REGION") {
            if let Ok(r) = region.parse() {
                self.region = r;
            }
        }

        if let Some(proxy) = var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Some(bind) = var("AMZ_BIND") {
            self.bind_addr = bind;
        }

        if let Some(tag) = var("AMZ_PARTNER_TAG").filter(|t| !t.trim().is_empty()) {
            self.partner_tag = tag;
        }

        if let Some(key) = var("AMZ_ACCESS_KEY") {
            self.access_key = Some(key);
        }

        if let Some(key) = var("AMZ_SECRET_KEY") {
            self.secret_key = Some(key);
        }

        self
    }

    /// Returns the PA-API key pair when both halves are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let access_key = self.access_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let secret_key = self.secret_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;

        Some(Credentials { access_key: access_key.to_string(), secret_key: secret_key.to_string() })
    }

    /// Builds the validated short-link table.
    pub fn short_links(&self) -> Result<ShortLinks, InvalidAsin> {
        ShortLinks::from_map(&self.short_links)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    /// Applies command-line flags; unset flags keep the file/env value.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(proxy) = overrides.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(tag) = overrides.partner_tag {
            self.partner_tag = tag;
        }
        if let Some(bind) = overrides.bind_addr {
            self.bind_addr = bind;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        self
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<Region>,
    pub proxy: Option<String>,
    pub partner_tag: Option<String>,
    pub bind_addr: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Output format for the `resolve` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region, Region::Us);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.api_timeout_secs, 10);
        assert_eq!(config.scrape_timeout_secs, 10);
        assert_eq!(config.min_page_len, 2000);
        assert_eq!(config.retry, RetryPolicy { enabled: true, delay_ms: 1000 });
        assert_eq!(config.redirect_delay_secs, 5);
        assert_eq!(config.request_deadline(), Duration::from_secs(25));
        assert_eq!(config.short_links.get("amzn.to/468mKVM").map(String::as_str), Some("B09P21T2GC"));
        assert!(config.proxy.is_none());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            region = "de"
            proxy = "socks5://localhost:1080"
            bind_addr = "127.0.0.1:8080"
            partner_tag = "mytag-21"
            access_key = "AKIDEXAMPLE"
            secret_key = "secret"
            api_timeout_secs = 8
            scrape_timeout_secs = 12
            min_page_len = 500
            redirect_delay_secs = 3
            request_deadline_secs = 30
            format = "json"

            [retry]
            enabled = false
            delay_ms = 250

            [short_links]
            "amzn.to/abc" = "B08N5WRWNW"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.region, Region::De);
        assert_eq!(config.proxy.as_deref(), Some("socks5://localhost:1080"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.partner_tag, "mytag-21");
        assert_eq!(config.api_timeout_secs, 8);
        assert_eq!(config.scrape_timeout_secs, 12);
        assert_eq!(config.min_page_len, 500);
        assert_eq!(config.retry, RetryPolicy { enabled: false, delay_ms: 250 });
        assert_eq!(config.redirect_delay_secs, 3);
        assert_eq!(config.request_deadline_secs, 30);
        assert_eq!(config.format, OutputFormat::Json);

        let links = config.short_links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links.lookup("https://amzn.to/abc").unwrap().as_str(), "B08N5WRWNW");

        let creds = config.credentials().unwrap();
        assert_eq!(creds.access_key, "AKIDEXAMPLE");
        assert_eq!(creds.secret_key, "secret");
    }

    #[test]
    fn test_config_partial_retry_table() {
        let config: Config = toml::from_str("[retry]\nenabled = false\n").unwrap();
        assert!(!config.retry.enabled);
        assert_eq!(config.retry.delay_ms, 1000);
    }

    #[test]
    fn test_config_invalid_short_link() {
        let config: Config = toml::from_str("[short_links]\n\"amzn.to/x\" = \"bad\"\n").unwrap();
        assert!(config.short_links().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            region = "fr"
            partner_tag = "fr-tag-21"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.region, Region::Fr);
        assert_eq!(config.partner_tag, "fr-tag-21");
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "region = \"jp\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.region, Region::Jp);
    }

    #[test]
    fn test_config_with_vars() {
        let config = Config::new().with_vars(vars(&[
            ("AMZ_REGION", "au"),
            ("AMZ_PROXY", "http://proxy:8080"),
            ("AMZ_BIND", "127.0.0.1:9000"),
            ("AMZ_PARTNER_TAG", "envtag-20"),
            ("AMZ_ACCESS_KEY", "AK"),
            ("AMZ_SECRET_KEY", "SK"),
        ]));

        assert_eq!(config.region, Region::Au);
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.partner_tag, "envtag-20");
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_config_with_vars_invalid_values_ignored() {
        let config =
            Config::new().with_vars(vars(&[("AMZ_REGION", "invalid_region"), ("AMZ_PARTNER_TAG", " ")]));
        assert_eq!(config.region, Region::Us);
        assert_eq!(config.partner_tag, "amzredirect-20");
    }

    #[test]
    fn test_credentials_need_both_keys() {
        let config = Config { access_key: Some("AK".to_string()), ..Config::default() };
        assert!(config.credentials().is_none());

        let config = Config {
            access_key: Some("AK".to_string()),
            secret_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials { access_key: "AK".to_string(), secret_key: "hunter2".to_string() };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AK"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_overrides_keep_file_values_when_unset() {
        let config: Config = toml::from_str("format = \"json\"\nregion = \"de\"\n").unwrap();
        let config = config.with_overrides(Overrides::default());
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.region, Region::De);
    }

    #[test]
    fn test_overrides_replace_given_values() {
        let config: Config = toml::from_str("format = \"json\"\nregion = \"de\"\n").unwrap();
        let config = config.with_overrides(Overrides {
            region: Some(Region::Uk),
            proxy: Some("socks5://localhost:1080".to_string()),
            partner_tag: Some("cli-21".to_string()),
            bind_addr: Some("127.0.0.1:9000".to_string()),
            format: Some(OutputFormat::Table),
        });
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.region, Region::Uk);
        assert_eq!(config.proxy.as_deref(), Some("socks5://localhost:1080"));
        assert_eq!(config.partner_tag, "cli-21");
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }
}
