// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quotagate - a quota-enforcing, cost-accounting OpenAI proxy.
//!
//! This is the binary entry point for the proxy.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod pricing;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quotagate_config::{ConfigError, QuotagateConfig};

/// Quotagate - a quota-enforcing, cost-accounting OpenAI proxy.
#[derive(Parser, Debug)]
#[command(name = "quotagate", version, about, long_about = None)]
struct Cli {
    /// Global spending ceiling in USD (overrides `cost.quota_usd`).
    #[arg(long, global = true, allow_negative_numbers = true)]
    quota: Option<f64>,

    /// Port to listen on (overrides `server.port`).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Path to the model pricing CSV (overrides `cost.pricing_file`).
    #[arg(long, global = true)]
    pricing: Option<String>,

    /// Load this config file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Start the proxy server (default).
    Serve,
    /// Show the loaded pricing catalog, or how a model is priced.
    Pricing {
        /// Model name to resolve against the catalog.
        model: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Load the configuration, apply the command-line overrides, and
    /// validate the result.
    fn resolve_config(&self) -> Result<QuotagateConfig, Vec<ConfigError>> {
        let mut config = match &self.config {
            Some(path) => quotagate_config::load_and_validate_path(path)?,
            None => quotagate_config::load_and_validate()?,
        };
        self.apply_overrides(&mut config);
        quotagate_config::validation::validate_config(&config)?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut QuotagateConfig) {
        if let Some(quota) = self.quota {
            config.cost.quota_usd = quota;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(pricing) = &self.pricing {
            config.cost.pricing_file = pricing.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(errors) => {
            quotagate_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Pricing { model, json } => {
            if let Err(e) = pricing::run_pricing(&config, model.as_deref(), json) {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}
