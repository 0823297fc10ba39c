//! Errors raised by product sources.
//!
//! None of these reach a caller of the resolver; they decide whether the
//! next source is tried and end up in the logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("API returned errors: {0}")]
    Api(String),

    #[error("blocked page detected: {0}")]
    Blocked(String),

    #[error("no product data for {0}")]
    Empty(String),
}

impl SourceError {
    /// Builds a transport error keeping the full context chain.
    pub fn transport(err: &anyhow::Error) -> Self {
        SourceError::Transport(format!("{err:#}"))
    }
}
