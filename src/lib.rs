//! amz-redirect - Amazon affiliate link interstitial server
//!
//! Extracts an ASIN from an inbound link, resolves product data through the
//! Product Advertising API and/or page scraping, and serves a share-friendly
//! page that forwards the visitor to an affiliate-tagged product URL.

pub mod amazon;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod paapi;
pub mod render;
pub mod resolver;
pub mod server;

pub use amazon::models::{PartialProduct, ProductRecord, RecordSource};
pub use amazon::regions::Region;
pub use amazon::{Asin, AsinExtractor, ShortLinks};
pub use config::Config;
pub use render::PageRenderer;
pub use resolver::{ProductResolver, ProductSource};
