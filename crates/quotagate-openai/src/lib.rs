// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat completions provider for the Quotagate proxy.
//!
//! This crate implements [`CompletionProvider`] by forwarding the caller's
//! request and bearer credential to the configured upstream endpoint.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use quotagate_config::model::UpstreamConfig;
use quotagate_core::{ChatRequest, ChatResponse, CompletionProvider, QuotaError};
use tracing::info;

pub use crate::client::OpenAiClient;

/// Upstream provider implementing [`CompletionProvider`].
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from the `[upstream]` configuration section.
    pub fn new(config: &UpstreamConfig) -> Result<Self, QuotaError> {
        let client = OpenAiClient::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(
            base_url = config.base_url.as_str(),
            timeout_secs = config.timeout_secs,
            "OpenAI provider initialized"
        );
        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<ChatResponse, QuotaError> {
        self.client.complete(request, credential).await
    }
}
