//! Product Advertising API 5.0: request signing, models and client.

pub mod client;
pub mod models;
pub mod signer;

pub use client::PaApiClient;
pub use signer::Signer;
