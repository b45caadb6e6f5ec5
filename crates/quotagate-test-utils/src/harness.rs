// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for admission integration testing.
//!
//! `TestHarness` assembles an `AdmissionController` over an in-memory
//! catalog, a fresh ledger, and a `MockProvider`. Provides `chat()` to drive
//! the full admission pipeline in tests.

use std::sync::Arc;

use quotagate_admission::{AdmissionController, ModelAllowList};
use quotagate_core::{ChatResponse, QuotaError, TiktokenCounter, TokenCounter};
use quotagate_cost::{BudgetLedger, PriceCatalog, PriceEntry};
use serde_json::json;

use crate::mock_provider::MockProvider;

/// Credential header used by [`TestHarness::chat`].
pub const TEST_AUTHORIZATION: &str = "Bearer sk-test-key";

/// The catalog used when a test does not supply its own.
pub fn test_catalog() -> PriceCatalog {
    PriceCatalog::from_entries([
        PriceEntry::new("gpt-4o", 2.5, 10.0),
        PriceEntry::new("gpt-4o-mini", 0.15, 0.6),
        PriceEntry::new("gpt-4.1", 2.0, 8.0),
        PriceEntry::new("o3", 2.0, 8.0),
        PriceEntry::new("o4-mini", 1.1, 4.4),
        PriceEntry::new("gpt-3.5-turbo", 0.5, 1.5),
    ])
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    ceiling: f64,
    catalog: Option<PriceCatalog>,
    allowed_prefixes: Vec<String>,
    provider: Option<MockProvider>,
    tokenizer: Option<Arc<dyn TokenCounter>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            ceiling: 2.0,
            catalog: None,
            allowed_prefixes: Vec::new(),
            provider: None,
            tokenizer: None,
        }
    }

    /// Set the global cost ceiling (default 2.0).
    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Replace the default test catalog.
    pub fn with_catalog(mut self, catalog: PriceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use explicit allow-list prefixes instead of the catalog keys.
    pub fn with_allowed_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.allowed_prefixes = prefixes;
        self
    }

    /// Use a preconfigured mock provider.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.provider = Some(MockProvider::with_responses(responses));
        self
    }

    /// Use a custom token counter (default: tiktoken).
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn TokenCounter>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn build(self) -> TestHarness {
        let catalog = Arc::new(self.catalog.unwrap_or_else(test_catalog));
        let allow_list = ModelAllowList::resolve(&self.allowed_prefixes, &catalog);
        let ledger = Arc::new(BudgetLedger::new(self.ceiling));
        let provider = Arc::new(self.provider.unwrap_or_default());
        let tokenizer = self
            .tokenizer
            .unwrap_or_else(|| Arc::new(TiktokenCounter::new()));

        let controller = Arc::new(AdmissionController::new(
            catalog,
            Arc::clone(&ledger),
            allow_list,
            tokenizer,
            provider.clone(),
        ));

        TestHarness {
            controller,
            ledger,
            provider,
        }
    }
}

/// Assembled admission stack for end-to-end tests.
pub struct TestHarness {
    pub controller: Arc<AdmissionController>,
    pub ledger: Arc<BudgetLedger>,
    pub provider: Arc<MockProvider>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send a single-message chat request with the default test credential.
    pub async fn chat(&self, model: &str, content: &str) -> Result<ChatResponse, QuotaError> {
        self.send(Some(TEST_AUTHORIZATION), &chat_body(model, content))
            .await
    }

    /// Send a raw request through the controller.
    pub async fn send(
        &self,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<ChatResponse, QuotaError> {
        self.controller.handle(authorization, body).await
    }
}

/// JSON body for a one-message user request.
pub fn chat_body(model: &str, content: &str) -> Vec<u8> {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": content}],
    })
    .to_string()
    .into_bytes()
}
