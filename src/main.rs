// src/main.rs

//! mlscan CLI
//!
//! Local entry point: serve the API, run a one-shot scan, or validate
//! configuration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use mlscan::{
    api::{AppState, serve},
    error::Result,
    models::Config,
    pipeline::run_scan,
    services::ListingScanner,
    storage::build_store,
};

/// mlscan - MercadoLibre Listing Scanner
#[derive(Parser, Debug)]
#[command(name = "mlscan", version, about = "Scans MercadoLibre listings and reports new products")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a single scan and print the summary as JSON
    Scan,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Serve { bind } => {
            config.validate()?;
            let config = Arc::new(config);
            let scanner = Arc::new(ListingScanner::new(Arc::clone(&config))?);
            let store = build_store(&config.storage);

            log::info!(
                "Storage mode: {} ({} categories configured)",
                config.storage.mode.as_str(),
                config.categories.len()
            );

            let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            let state = AppState::new(config, scanner, store);
            serve(state, &bind_addr).await?;
        }

        Command::Scan => {
            config.validate()?;
            let config = Arc::new(config);
            let scanner = ListingScanner::new(Arc::clone(&config))?;
            let store = build_store(&config.storage);

            let summary = run_scan(&scanner, store.as_deref(), &config).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Validate => {
            log::info!("Validating configuration from {}", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }

            log::info!("✓ Config OK");
            log::info!("  user agent: {}", config.scanner.user_agent);
            log::info!(
                "  timeouts: probe {}s, fetch {}s",
                config.scanner.probe_timeout_secs,
                config.scanner.fetch_timeout_secs
            );
            log::info!("  storage mode: {}", config.storage.mode.as_str());
            for category in &config.categories {
                log::info!(
                    "  category {} (max {} pages)",
                    category.name,
                    category.max_pages
                );
            }
        }
    }

    Ok(())
}
