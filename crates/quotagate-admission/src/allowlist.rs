// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model allow-list by family prefix.
//!
//! Built once at startup: explicit configured prefixes win, otherwise every
//! catalog key becomes a prefix, and an empty catalog falls back to a fixed
//! list of model families.

use quotagate_core::QuotaError;
use quotagate_cost::PriceCatalog;

/// Model families accepted when neither configuration nor the catalog supply any.
pub const FALLBACK_MODEL_PREFIXES: &[&str] = &[
    "gpt-4o",
    "gpt-4-1106-preview",
    "gpt-4.1",
    "o3",
    "o4",
    "gpt-3.5",
];

/// Ordered list of accepted model-name prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAllowList {
    prefixes: Vec<String>,
}

impl ModelAllowList {
    /// Build from explicit prefixes. Empty entries are dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_MODEL_PREFIXES.iter().copied())
    }

    /// Every catalog key (sorted) as a prefix, or the fallback list when
    /// the catalog is empty.
    pub fn from_catalog(catalog: &PriceCatalog) -> Self {
        if catalog.is_empty() {
            return Self::fallback();
        }
        Self::new(catalog.keys())
    }

    /// Configured prefixes when any are given, else [`Self::from_catalog`].
    pub fn resolve(configured: &[String], catalog: &PriceCatalog) -> Self {
        let configured = Self::new(configured.iter().cloned());
        if configured.prefixes.is_empty() {
            Self::from_catalog(catalog)
        } else {
            configured
        }
    }

    pub fn is_allowed(&self, model: &str) -> bool {
        self.prefixes.iter().any(|p| model.starts_with(p.as_str()))
    }

    /// Fail with [`QuotaError::ModelNotAllowed`] for a model outside the list.
    pub fn check(&self, model: &str) -> Result<(), QuotaError> {
        if self.is_allowed(model) {
            Ok(())
        } else {
            Err(QuotaError::ModelNotAllowed {
                model: model.to_string(),
            })
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
