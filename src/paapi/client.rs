//! Signed GetItems calls against the Product Advertising API.

use crate::amazon::asin::Asin;
use crate::amazon::models::PartialProduct;
use crate::amazon::regions::Region;
use crate::config::{Config, Credentials};
use crate::error::SourceError;
use crate::paapi::models::{GetItemsRequest, GetItemsResponse};
use crate::paapi::signer::{Signer, AMZ_DATE_FORMAT};
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;

pub const SERVICE: &str = "ProductAdvertisingAPI";
pub const GET_ITEMS_PATH: &str = "/paapi5/getitems";
pub const GET_ITEMS_TARGET: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// PA-API client bound to one marketplace and key pair.
pub struct PaApiClient {
    client: Client,
    signer: Signer,
    region: Region,
    partner_tag: String,
    base_url: Option<String>,
}

impl PaApiClient {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        Self::with_base_url(config, credentials, None)
    }

    /// Creates a client with an optional custom base URL (for testing).
    ///
    /// The signed `Host` stays the marketplace's PA-API host either way.
    pub fn with_base_url(
        config: &Config,
        credentials: Credentials,
        base_url: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .connect_timeout(Duration::from_secs(config.api_timeout_secs.min(10)))
            .build()
            .context("Failed to build PA-API client")?;

        let signer = Signer::new(
            credentials.access_key,
            credentials.secret_key,
            config.region.paapi_region(),
            SERVICE,
        );

        Ok(Self {
            client,
            signer,
            region: config.region,
            partner_tag: config.partner_tag.clone(),
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        let base =
            self.base_url.clone().unwrap_or_else(|| format!("https://{}", self.region.paapi_host()));
        format!("{}{}", base, GET_ITEMS_PATH)
    }

    /// Fetches title, image and price for one ASIN.
    pub async fn get_item(&self, asin: &Asin) -> Result<PartialProduct, SourceError> {
        let request =
            GetItemsRequest::single(asin.as_str(), &self.partner_tag, &self.region.marketplace());
        let payload =
            serde_json::to_string(&request).map_err(|e| SourceError::Decode(e.to_string()))?;

        let host = self.region.paapi_host();
        let now = Utc::now();
        let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
        let authorization = self.signer.authorization(
            "POST",
            GET_ITEMS_PATH,
            "",
            &[
                ("content-type", CONTENT_TYPE),
                ("host", host.as_str()),
                ("x-amz-date", amz_date.as_str()),
                ("x-amz-target", GET_ITEMS_TARGET),
            ],
            payload.as_bytes(),
            now,
        );

        let url = self.endpoint();
        debug!("POST {} for {}", url, asin);

        let response = self
            .client
            .post(url.as_str())
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", host.as_str())
            .header("X-Amz-Date", amz_date.as_str())
            .header("X-Amz-Target", GET_ITEMS_TARGET)
            .body(payload)
            .send()
            .await
            .context("Failed to send PA-API request")
            .map_err(|e| SourceError::transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read PA-API response body")
            .map_err(|e| SourceError::transport(&e))?;

        if !status.is_success() {
            let summary = serde_json::from_str::<GetItemsResponse>(&body)
                .ok()
                .and_then(|r| r.error_summary());
            return Err(match summary {
                Some(summary) => SourceError::Api(format!("HTTP {}: {}", status.as_u16(), summary)),
                None => SourceError::Status { status: status.as_u16(), url },
            });
        }

        let parsed: GetItemsResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        if let Some(marker) = parsed.internal_failure() {
            return Err(SourceError::Api(marker.to_string()));
        }
        if let Some(summary) = parsed.error_summary() {
            return Err(SourceError::Api(summary));
        }

        let partial = parsed
            .first_item()
            .map(|item| item.into_partial())
            .ok_or_else(|| SourceError::Empty(asin.to_string()))?;

        if partial.title.is_none() && partial.image.is_none() {
            return Err(SourceError::Empty(asin.to_string()));
        }

        info!("PA-API returned data for {}", asin);
        Ok(partial)
    }
}
