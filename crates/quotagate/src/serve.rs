// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotagate serve` command implementation.
//!
//! Loads the pricing catalog, builds the model allow-list and the budget
//! ledger, wires the admission controller to the OpenAI upstream, and serves
//! the proxy until SIGINT or SIGTERM.

use std::sync::Arc;

use quotagate_admission::{AdmissionController, ModelAllowList};
use quotagate_config::model::{CostConfig, QuotagateConfig};
use quotagate_core::{QuotaError, TiktokenCounter};
use quotagate_cost::{BudgetLedger, PriceCatalog};
use quotagate_gateway::{start_server, GatewayState, ServerConfig};
use quotagate_openai::OpenAiProvider;
use tracing::{debug, info, warn};

/// Runs the `quotagate serve` command.
pub async fn run_serve(config: QuotagateConfig) -> Result<(), QuotaError> {
    init_tracing(&config.server.log_level);

    info!("starting quotagate serve");

    let catalog = Arc::new(load_catalog(&config.cost));
    let allow_list = ModelAllowList::resolve(&config.cost.allowed_model_prefixes, &catalog);
    let ledger = Arc::new(BudgetLedger::new(config.cost.quota_usd));
    let provider = Arc::new(OpenAiProvider::new(&config.upstream)?);
    let tokenizer = Arc::new(TiktokenCounter::new());

    info!(
        quota_usd = config.cost.quota_usd,
        models = ?catalog.keys(),
        allowed_prefixes = ?allow_list.prefixes(),
        "budget and pricing ready"
    );

    let controller = Arc::new(AdmissionController::new(
        catalog,
        ledger,
        allow_list,
        tokenizer,
        provider,
    ));

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server_config, GatewayState { controller }, shutdown_signal()).await
}

/// Loads the pricing catalog, falling back to an empty one on failure.
///
/// An empty catalog prices every model at the configured default rates.
pub(crate) fn load_catalog(cost: &CostConfig) -> PriceCatalog {
    let catalog = match PriceCatalog::load(&cost.pricing_file) {
        Ok(catalog) => {
            info!(
                path = cost.pricing_file.as_str(),
                models = catalog.len(),
                "pricing catalog loaded"
            );
            catalog
        }
        Err(e) => {
            warn!(
                path = cost.pricing_file.as_str(),
                error = %e,
                "failed to load pricing, using default pricing"
            );
            PriceCatalog::new()
        }
    };
    catalog.with_fallback_rates(cost.default_input_per_mtok, cost.default_output_per_mtok)
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
    debug!("shutdown signal handler completed");
}

/// Initializes the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quotagate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn cost_config(pricing_file: String) -> CostConfig {
        CostConfig {
            pricing_file,
            ..CostConfig::default()
        }
    }

    #[test]
    fn missing_pricing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv").display().to_string();
        let catalog = load_catalog(&cost_config(path));
        assert!(catalog.is_empty());

        let (entry, matched) = catalog.resolve("gpt-4o");
        assert!(!matched);
        assert_eq!(entry.input, 30.0);
        assert_eq!(entry.output, 60.0);
    }

    #[test]
    fn configured_default_rates_apply_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut cost = cost_config(dir.path().join("absent.csv").display().to_string());
        cost.default_input_per_mtok = 1.0;
        cost.default_output_per_mtok = 2.0;
        let catalog = load_catalog(&cost);
        let (entry, _) = catalog.resolve("anything");
        assert_eq!((entry.input, entry.output), (1.0, 2.0));
    }

    #[test]
    fn pricing_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "model,version,input,cached_input,output").unwrap();
        writeln!(file, "gpt-4o,gpt-4o-2024-08-06,2.5,1.25,10").unwrap();
        let catalog = load_catalog(&cost_config(file.path().display().to_string()));
        assert!(catalog.resolve("gpt-4o").1);
        assert!(catalog.resolve("gpt-4o-2024-08-06").1);
    }

    #[test]
    fn bundled_pricing_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/model_pricing.csv");
        let catalog = load_catalog(&cost_config(path.to_string()));
        assert!(!catalog.is_empty());
        assert!(catalog.resolve("gpt-4o-mini").1);
    }
}
