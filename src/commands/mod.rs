//! CLI command implementations.

pub mod resolve;
pub mod serve;

pub use resolve::ResolveCommand;
pub use serve::ServeCommand;
