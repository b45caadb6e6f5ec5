// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quotagate pricing` command implementation.
//!
//! Prints the loaded pricing catalog, or shows which entry a model name
//! resolves to and what a million prompt/completion tokens would cost.

use std::collections::BTreeMap;

use quotagate_config::model::QuotagateConfig;
use quotagate_core::QuotaError;
use quotagate_cost::{calculate_cost, PriceCatalog, PriceEntry};
use serde::Serialize;

use crate::serve::load_catalog;

/// How a single model name resolves against the catalog.
#[derive(Debug, Serialize)]
pub struct Resolution<'a> {
    pub model: &'a str,
    /// False when the default entry was used.
    pub matched: bool,
    pub entry: &'a PriceEntry,
    /// Cost of one million prompt tokens plus one million completion tokens.
    pub cost_per_mtok_pair: f64,
}

/// Run the `quotagate pricing` command.
pub fn run_pricing(
    config: &QuotagateConfig,
    model: Option<&str>,
    json: bool,
) -> Result<(), QuotaError> {
    let catalog = load_catalog(&config.cost);
    let output = match model {
        Some(model) => render_resolution(&resolve(&catalog, model), json)?,
        None => render_catalog(&catalog, json)?,
    };
    println!("{output}");
    Ok(())
}

fn resolve<'a>(catalog: &'a PriceCatalog, model: &'a str) -> Resolution<'a> {
    let (entry, matched) = catalog.resolve(model);
    Resolution {
        model,
        matched,
        entry,
        cost_per_mtok_pair: calculate_cost(1_000_000, 1_000_000, entry),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, QuotaError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| QuotaError::Internal(format!("failed to serialize pricing: {e}")))
}

fn render_resolution(resolution: &Resolution<'_>, json: bool) -> Result<String, QuotaError> {
    if json {
        return to_json(resolution);
    }
    let entry = resolution.entry;
    let source = if resolution.matched {
        format!("catalog entry `{}`", entry.model)
    } else {
        "default pricing (no catalog match)".to_string()
    };
    Ok(format!(
        "{model}\n  priced by: {source}\n  input:  ${input:.4} / 1M tokens\n  output: ${output:.4} / 1M tokens",
        model = resolution.model,
        input = entry.input,
        output = entry.output,
    ))
}

fn render_catalog(catalog: &PriceCatalog, json: bool) -> Result<String, QuotaError> {
    if json {
        let sorted: BTreeMap<&str, &PriceEntry> = catalog
            .entries()
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        return to_json(&sorted);
    }
    if catalog.is_empty() {
        let fallback = catalog.fallback();
        return Ok(format!(
            "no pricing loaded; every model uses default pricing (input ${:.4}, output ${:.4} per 1M tokens)",
            fallback.input, fallback.output
        ));
    }

    let width = catalog.keys().iter().map(|k| k.len()).max().unwrap_or(0);
    let mut lines = vec![format!(
        "{:<width$}  {:>10}  {:>10}  {:>10}",
        "MODEL", "INPUT", "CACHED", "OUTPUT"
    )];
    for key in catalog.keys() {
        let (entry, _) = catalog.resolve(key);
        lines.push(format!(
            "{key:<width$}  {:>10.4}  {:>10.4}  {:>10.4}",
            entry.input, entry.cached_input, entry.output
        ));
    }
    Ok(lines.join("\n"))
}
