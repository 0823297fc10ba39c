//! Runs the redirect server.

use crate::config::Config;
use crate::server::{self, AppState};
use anyhow::Result;
use tracing::info;

pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serves until interrupted.
    pub async fn execute(&self) -> Result<()> {
        let state = AppState::from_config(&self.config)?;
        info!(
            "Serving {} links tagged '{}' (redirect after {}s)",
            self.config.region, self.config.partner_tag, self.config.redirect_delay_secs
        );
        server::serve(state, &self.config.bind_addr).await
    }
}
