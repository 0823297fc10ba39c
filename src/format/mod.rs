//! Output formatting for resolved records and the marketplace list (table, JSON).

use crate::amazon::{ProductRecord, Region};
use crate::config::OutputFormat;
use serde::Serialize;

/// Formats command output.
pub struct Formatter {
    format: OutputFormat,
}

#[derive(Serialize)]
struct RegionRow {
    code: String,
    domain: &'static str,
    paapi_host: String,
    paapi_region: &'static str,
}

impl From<Region> for RegionRow {
    fn from(region: Region) -> Self {
        Self {
            code: region.to_string(),
            domain: region.domain(),
            paapi_host: region.paapi_host(),
            paapi_region: region.paapi_region(),
        }
    }
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single resolved record, with the link it would redirect to.
    pub fn format_record(&self, record: &ProductRecord, affiliate_url: &str) -> String {
        match self.format {
            OutputFormat::Json => self.json_record(record, affiliate_url),
            OutputFormat::Table => self.table_record(record, affiliate_url),
        }
    }

    /// Formats the marketplace list.
    pub fn format_regions(&self, regions: &[Region]) -> String {
        let rows: Vec<RegionRow> = regions.iter().copied().map(RegionRow::from).collect();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_regions(&rows),
        }
    }

    // JSON formatting

    fn json_record(&self, record: &ProductRecord, affiliate_url: &str) -> String {
        let mut value = serde_json::to_value(record).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert("affiliate_url".to_string(), affiliate_url.into());
        }
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_record(&self, record: &ProductRecord, affiliate_url: &str) -> String {
        let price = if record.price.is_empty() { "N/A" } else { record.price.as_str() };

        [
            format!("ASIN:    {}", record.asin),
            format!("Title:   {}", record.title),
            format!("Image:   {}", record.image),
            format!("Price:   {}", price),
            format!("Source:  {}", record.source),
            format!("Link:    {}", affiliate_url),
        ]
        .join("\n")
    }

    fn table_regions(&self, rows: &[RegionRow]) -> String {
        let code_width = 4;
        let domain_width = 14;
        let host_width = 26;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<code_width$}  {:<domain_width$}  {:<host_width$}  {}",
            "Code", "Domain", "PA-API host", "AWS region"
        ));
        lines.push(format!(
            "{:-<code_width$}  {:-<domain_width$}  {:-<host_width$}  {:-<10}",
            "", "", "", ""
        ));

        for row in rows {
            lines.push(format!(
                "{:<code_width$}  {:<domain_width$}  {:<host_width$}  {}",
                row.code, row.domain, row.paapi_host, row.paapi_region
            ));
        }

        lines.join("\n")
    }
}
