// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream completion provider trait.

use async_trait::async_trait;

use crate::error::QuotaError;
use crate::types::{ChatRequest, ChatResponse};

/// The upstream chat completion API.
///
/// Implementations perform exactly one attempt per call. Any transport error
/// or non-success status is reported as [`QuotaError::Upstream`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Forward `request` upstream, authenticating with the caller's `credential`.
    async fn complete(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<ChatResponse, QuotaError>;
}
