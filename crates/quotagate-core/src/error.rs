// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Quotagate proxy.

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Machine-readable discriminator for a [`QuotaError`].
///
/// Serialized into every error response body so callers can branch on the
/// failure without parsing the message text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationLoadFailure,
    Config,
    Unauthorized,
    ModelNotAllowed,
    MalformedRequest,
    BudgetExhausted,
    BudgetWouldBeExceeded,
    UpstreamFailure,
    Internal,
}

/// The primary error type used across the Quotagate crates.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// The pricing source could not be opened, read, or held too few rows.
    #[error("pricing load error: {message}")]
    Pricing {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, bad values, unusable addresses).
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or malformed caller credential.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The requested model does not match any allowed family prefix.
    #[error("model `{model}` is not in the allowed list")]
    ModelNotAllowed { model: String },

    /// The request body could not be parsed into a chat completion request.
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    /// Total spend had already reached the ceiling before this request.
    #[error("global cost limit exceeded (spent ${total_spent:.6} of ${ceiling:.6})")]
    BudgetExhausted { total_spent: f64, ceiling: f64 },

    /// The pre-flight estimate would push total spend to or past the ceiling.
    #[error(
        "request would exceed global cost limit (estimated ${estimated_cost:.6}, \
         spent ${total_spent:.6} of ${ceiling:.6})"
    )]
    BudgetWouldBeExceeded {
        estimated_cost: f64,
        total_spent: f64,
        ceiling: f64,
    },

    /// The upstream completion API failed or returned a non-success status.
    #[error("upstream API call error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuotaError {
    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Pricing { .. } => ErrorKind::ConfigurationLoadFailure,
            Self::Config(_) => ErrorKind::Config,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ModelNotAllowed { .. } => ErrorKind::ModelNotAllowed,
            Self::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            Self::BudgetExhausted { .. } => ErrorKind::BudgetExhausted,
            Self::BudgetWouldBeExceeded { .. } => ErrorKind::BudgetWouldBeExceeded,
            Self::Upstream { .. } => ErrorKind::UpstreamFailure,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for an [`QuotaError::Unauthorized`] with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Shorthand for an [`QuotaError::Upstream`] without a source error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }
}
