// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error body returned by the chat completions API.

use serde::Deserialize;

/// Error response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Error type identifier, e.g. `invalid_request_error`.
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    /// Machine code such as `model_not_found`. Sometimes absent or null.
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorDetail {
    /// `type` if present, else `code`, else "unknown".
    pub fn label(&self) -> &str {
        self.type_
            .as_deref()
            .or(self.code.as_deref())
            .unwrap_or("unknown")
    }
}
