// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as plausible hosts, non-empty paths, and usable rates.
//! The quota only has to be finite: a zero or negative ceiling simply
//! rejects every request.

use crate::diagnostic::ConfigError;
use crate::model::QuotagateConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &QuotagateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |key: &str, message: String| {
        errors.push(ConfigError::Validation {
            key: key.to_string(),
            message,
        });
    };

    let host = config.server.host.trim();
    if host.is_empty() {
        invalid("server.host", "must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(
                "server.host",
                format!("`{host}` is not a valid IP address or hostname"),
            );
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.to_ascii_lowercase().as_str()) {
        invalid(
            "server.log_level",
            format!(
                "`{}` is not one of {}",
                config.server.log_level,
                LOG_LEVELS.join(", ")
            ),
        );
    }

    if config.cost.pricing_file.trim().is_empty() {
        invalid("cost.pricing_file", "must not be empty".to_string());
    }

    if !config.cost.quota_usd.is_finite() {
        invalid(
            "cost.quota_usd",
            format!("must be a finite number, got {}", config.cost.quota_usd),
        );
    }

    for (key, rate) in [
        ("cost.default_input_per_mtok", config.cost.default_input_per_mtok),
        ("cost.default_output_per_mtok", config.cost.default_output_per_mtok),
    ] {
        if !rate.is_finite() || rate < 0.0 {
            invalid(key, format!("must be a non-negative number, got {rate}"));
        }
    }

    for (i, prefix) in config.cost.allowed_model_prefixes.iter().enumerate() {
        if prefix.trim().is_empty() {
            invalid(
                &format!("cost.allowed_model_prefixes[{i}]"),
                "must not be empty".to_string(),
            );
        }
    }

    let base_url = config.upstream.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        invalid(
            "upstream.base_url",
            format!("`{base_url}` must be an http:// or https:// URL"),
        );
    }

    if config.upstream.timeout_secs == 0 {
        invalid("upstream.timeout_secs", "must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error_for(errors: &[ConfigError], wanted: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { key, .. } if key == wanted))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&QuotagateConfig::default()).is_ok());
    }

    #[test]
    fn empty_host_fails_validation() {
        let mut config = QuotagateConfig::default();
        config.server.host = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "server.host"));
    }

    #[test]
    fn host_with_spaces_fails_validation() {
        let mut config = QuotagateConfig::default();
        config.server.host = "local host".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "server.host"));
    }

    #[test]
    fn hostnames_and_ipv6_pass() {
        for host in ["localhost", "0.0.0.0", "::1", "proxy.internal"] {
            let mut config = QuotagateConfig::default();
            config.server.host = host.to_string();
            assert!(validate_config(&config).is_ok(), "{host}");
        }
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = QuotagateConfig::default();
        config.server.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "server.log_level"));
    }

    #[test]
    fn negative_default_rate_fails_validation() {
        let mut config = QuotagateConfig::default();
        config.cost.default_output_per_mtok = -1.0;
        config.cost.default_input_per_mtok = f64::NAN;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "cost.default_output_per_mtok"));
        assert!(has_error_for(&errors, "cost.default_input_per_mtok"));
    }

    #[test]
    fn zero_and_negative_quota_are_accepted() {
        for quota in [0.0, -1.0] {
            let mut config = QuotagateConfig::default();
            config.cost.quota_usd = quota;
            assert!(validate_config(&config).is_ok());
        }
    }

    #[test]
    fn non_finite_quota_fails_validation() {
        for quota in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut config = QuotagateConfig::default();
            config.cost.quota_usd = quota;
            let errors = validate_config(&config).unwrap_err();
            assert!(has_error_for(&errors, "cost.quota_usd"), "{quota}");
        }
    }

    #[test]
    fn bad_upstream_settings_collect_all_errors() {
        let mut config = QuotagateConfig::default();
        config.upstream.base_url = "ftp://example.com".to_string();
        config.upstream.timeout_secs = 0;
        config.cost.pricing_file = String::new();
        config.cost.allowed_model_prefixes = vec!["gpt-4o".into(), "".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_error_for(&errors, "upstream.base_url"));
        assert!(has_error_for(&errors, "upstream.timeout_secs"));
        assert!(has_error_for(&errors, "cost.pricing_file"));
        assert!(has_error_for(&errors, "cost.allowed_model_prefixes[1]"));
    }
}
