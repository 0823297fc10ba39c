//! amz-redirect - Amazon affiliate link interstitial server
//!
//! Serves share-friendly product pages that redirect to affiliate-tagged Amazon URLs.

use amz_redirect::amazon::regions::Region;
use amz_redirect::commands::{ResolveCommand, ServeCommand};
use amz_redirect::config::{Config, OutputFormat, Overrides};
use amz_redirect::format::Formatter;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-redirect",
    version,
    about = "Amazon affiliate link interstitial server",
    long_about = "Extracts ASINs from inbound links, resolves product data via PA-API or scraping, and serves a redirect page with social-sharing metadata."
)]
struct Cli {
    /// Amazon marketplace
    #[arg(short, long, global = true, env = "AMZ_REGION")]
    region: Option<Region>,

    /// Proxy URL for scraping (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Affiliate tag appended to product links
    #[arg(short = 't', long, global = true, env = "AMZ_PARTNER_TAG")]
    tag: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json) [default: table]
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the redirect server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "AMZ_BIND")]
        bind: Option<String>,
    },

    /// Resolve one ASIN, path or product URL
    #[command(alias = "r")]
    Resolve {
        /// ASIN, path or product URL / short link
        input: String,

        /// Print the rendered page instead of the record
        #[arg(long)]
        html: bool,
    },

    /// List supported regions
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let bind_addr = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        _ => None,
    };

    // Load config with layered overrides
    let config = Config::load(cli.config.as_deref())?.with_env().with_overrides(Overrides {
        region: cli.region,
        proxy: cli.proxy,
        partner_tag: cli.tag,
        bind_addr,
        format: cli.format,
    });

    match cli.command {
        Commands::Serve { .. } => {
            ServeCommand::new(config).execute().await?;
        }

        Commands::Resolve { input, html } => {
            let output = ResolveCommand::new(config).with_html(html).execute(&input).await?;
            println!("{}", output);
        }

        Commands::Regions => {
            println!("{}", Formatter::new(config.format).format_regions(Region::all()));
        }
    }

    Ok(())
}
