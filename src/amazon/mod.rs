//! Amazon-specific modules for ASIN handling, HTTP client, parsing, and data models.

pub mod asin;
pub mod client;
pub mod image;
pub mod models;
pub mod parser;
pub mod regions;
pub mod selectors;

pub use asin::{Asin, AsinExtractor, ShortLinks};
pub use client::{AmazonClient, ProductPages};
pub use models::{PartialProduct, ProductRecord, RecordSource};
pub use parser::Parser;
pub use regions::Region;
