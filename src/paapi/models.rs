//! GetItems request and response bodies.

use crate::amazon::image;
use crate::amazon::models::PartialProduct;
use serde::{Deserialize, Serialize};

/// Resources requested for every item.
pub const RESOURCES: &[&str] = &[
    "Images.Primary.Large",
    "Images.Primary.Medium",
    "ItemInfo.Title",
    "Offers.Listings.Price",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsRequest {
    pub item_ids: Vec<String>,
    pub resources: Vec<String>,
    pub partner_tag: String,
    pub partner_type: String,
    pub marketplace: String,
}

impl GetItemsRequest {
    pub fn single(asin: &str, partner_tag: &str, marketplace: &str) -> Self {
        Self {
            item_ids: vec![asin.to_string()],
            resources: RESOURCES.iter().map(|r| r.to_string()).collect(),
            partner_tag: partner_tag.to_string(),
            partner_type: "Associates".to_string(),
            marketplace: marketplace.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsResponse {
    #[serde(default)]
    pub items_result: Option<ItemsResult>,
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
    /// Set on service-level faults, e.g. `com.amazon.paapi5#InternalFailure`.
    #[serde(default, rename = "__type")]
    pub error_type: Option<String>,
}

impl GetItemsResponse {
    /// Returns the internal-failure marker if the service reported one.
    pub fn internal_failure(&self) -> Option<&str> {
        self.error_type.as_deref().filter(|t| t.contains("InternalFailure"))
    }

    /// Joins the reported errors into one line.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn first_item(self) -> Option<Item> {
        self.items_result.and_then(|r| r.items.into_iter().next())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResult {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(rename = "ASIN", default)]
    pub asin: String,
    #[serde(default)]
    pub item_info: Option<ItemInfo>,
    #[serde(default)]
    pub images: Option<Images>,
    #[serde(default)]
    pub offers: Option<Offers>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemInfo {
    pub title: Option<DisplayValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValue {
    pub display_value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Images {
    pub primary: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageSet {
    pub large: Option<ImageRef>,
    pub medium: Option<ImageRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Offers {
    #[serde(default)]
    pub listings: Vec<Listing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listing {
    pub price: Option<ListingPrice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingPrice {
    pub display_amount: String,
}

impl Item {
    /// Flattens the nested response shape into the fields the page needs.
    pub fn into_partial(self) -> PartialProduct {
        let title = self
            .item_info
            .and_then(|info| info.title)
            .map(|t| t.display_value)
            .filter(|t| !t.trim().is_empty());

        let image = self
            .images
            .and_then(|i| i.primary)
            .and_then(|set| set.large.or(set.medium))
            .map(|img| img.url)
            .filter(|u| image::is_usable(u))
            .map(|u| image::to_high_res(&u));

        let price = self
            .offers
            .and_then(|o| o.listings.into_iter().find_map(|l| l.price))
            .map(|p| p.display_amount)
            .filter(|p| !p.trim().is_empty());

        PartialProduct { title, image, price }
    }
}
