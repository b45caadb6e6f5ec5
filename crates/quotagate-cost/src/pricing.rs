// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost calculation from token counts and catalog rates.
//!
//! cost = prompt_tokens * input / 1e6 + completion_tokens * output / 1e6
//!
//! The cached-input rate is carried in the catalog but never applied here.

use tracing::warn;

use crate::catalog::{PriceCatalog, PriceEntry};

const TOKENS_PER_MTOK: f64 = 1_000_000.0;

/// Compute the USD cost of a request from its token counts and a price entry.
pub fn calculate_cost(prompt_tokens: u64, completion_tokens: u64, entry: &PriceEntry) -> f64 {
    let input_cost = prompt_tokens as f64 * entry.input / TOKENS_PER_MTOK;
    let output_cost = completion_tokens as f64 * entry.output / TOKENS_PER_MTOK;
    input_cost + output_cost
}

/// Round a USD amount to 6 decimal places for reporting.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 1e6).round() / 1e6
}

impl PriceCatalog {
    /// Resolve `model` and compute the cost of the given token counts.
    ///
    /// Unknown models are priced at the fallback rates and logged.
    pub fn calculate_cost(&self, prompt_tokens: u64, completion_tokens: u64, model: &str) -> f64 {
        let (entry, matched) = self.resolve(model);
        if !matched {
            warn!(
                model,
                input = entry.input,
                output = entry.output,
                "no pricing found for model, using default rates"
            );
        }
        calculate_cost(prompt_tokens, completion_tokens, entry)
    }
}
