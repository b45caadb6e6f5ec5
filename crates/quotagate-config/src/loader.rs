// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./quotagate.toml` > `~/.config/quotagate/quotagate.toml` > `/etc/quotagate/quotagate.toml`
//! with environment variable overrides via `QUOTAGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::QuotagateConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/quotagate/quotagate.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "quotagate.toml";

/// `~/.config/quotagate/quotagate.toml`, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("quotagate").join("quotagate.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/quotagate/quotagate.toml` (system-wide)
/// 3. `~/.config/quotagate/quotagate.toml` (user XDG config)
/// 4. `./quotagate.toml` (local directory)
/// 5. `QUOTAGATE_*` environment variables
pub fn load_config() -> Result<QuotagateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<QuotagateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuotagateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QuotagateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuotagateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QuotagateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `QUOTAGATE_COST_QUOTA_USD` must map to `cost.quota_usd`,
/// not `cost.quota.usd`.
fn env_provider() -> Env {
    Env::prefixed("QUOTAGATE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: QUOTAGATE_SERVER_PORT -> "server_port"
        let mapped = key
            .as_str()
            .replacen("server_", "server.", 1)
            .replacen("cost_", "cost.", 1)
            .replacen("upstream_", "upstream.", 1);
        mapped.into()
    })
}
