// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Quotagate proxy.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Quotagate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotagateConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Budget ceiling and pricing settings.
    #[serde(default)]
    pub cost: CostConfig,

    /// Upstream completion API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind. Loopback by default: the proxy forwards caller keys.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Budget and pricing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    /// Global spending ceiling in USD. Zero or negative rejects every request.
    #[serde(default = "default_quota_usd")]
    pub quota_usd: f64,

    /// Path to the model pricing CSV.
    #[serde(default = "default_pricing_file")]
    pub pricing_file: String,

    /// Accepted model-name prefixes. Empty derives the list from the catalog.
    #[serde(default)]
    pub allowed_model_prefixes: Vec<String>,

    /// Input rate (USD per million tokens) for models missing from the catalog.
    #[serde(default = "default_input_per_mtok")]
    pub default_input_per_mtok: f64,

    /// Output rate (USD per million tokens) for models missing from the catalog.
    #[serde(default = "default_output_per_mtok")]
    pub default_output_per_mtok: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            quota_usd: default_quota_usd(),
            pricing_file: default_pricing_file(),
            allowed_model_prefixes: Vec::new(),
            default_input_per_mtok: default_input_per_mtok(),
            default_output_per_mtok: default_output_per_mtok(),
        }
    }
}

fn default_quota_usd() -> f64 {
    2.0
}

fn default_pricing_file() -> String {
    "config/model_pricing.csv".to_string()
}

fn default_input_per_mtok() -> f64 {
    30.0
}

fn default_output_per_mtok() -> f64 {
    60.0
}

/// Upstream completion API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Full chat completions endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}
