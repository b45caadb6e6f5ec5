// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request admission state machine.
//!
//! Each request moves Received -> Authorized -> Admitted -> Dispatched ->
//! Reconciled. Any failure before Reconciled ends the request without
//! touching the ledger; only a completed upstream round trip commits a cost.
//!
//! The controller integrates:
//! - **Budget ledger**: exhaustion gate before any work, estimate check before dispatch
//! - **Price catalog**: prompt-only estimate and final cost
//! - **Token counter**: prompt estimate and the local recount fallback
//! - **Completion provider**: the single upstream call, made outside any lock

use std::collections::BTreeMap;
use std::sync::Arc;

use quotagate_core::{
    count_message_tokens, ChatRequest, ChatResponse, CompletionProvider, ProxyUsage, QuotaError,
    TokenCounter,
};
use quotagate_cost::{round_usd, BudgetLedger, PriceCatalog, PriceEntry};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allowlist::ModelAllowList;
use crate::credential;

const STATUS_INFO: &str = "Local OpenAI proxy. Available method: POST.";

/// Stages a request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Body received, nothing checked yet.
    Received,
    /// Credential has the expected bearer shape.
    Authorized,
    /// Model allowed and the prompt-only estimate fits under the ceiling.
    Admitted,
    /// Upstream returned a completion.
    Dispatched,
    /// Final cost committed to the ledger.
    Reconciled,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::Authorized => write!(f, "authorized"),
            Stage::Admitted => write!(f, "admitted"),
            Stage::Dispatched => write!(f, "dispatched"),
            Stage::Reconciled => write!(f, "reconciled"),
        }
    }
}

/// Read-only view of the proxy's budget and catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub info: String,
    pub cost_limit: f64,
    pub current_cost: f64,
    pub remaining: f64,
    pub available_models: Vec<String>,
    pub models_count: usize,
}

/// Runs the admission protocol for chat completion requests.
pub struct AdmissionController {
    catalog: Arc<PriceCatalog>,
    ledger: Arc<BudgetLedger>,
    allow_list: ModelAllowList,
    tokenizer: Arc<dyn TokenCounter>,
    provider: Arc<dyn CompletionProvider>,
}

impl AdmissionController {
    pub fn new(
        catalog: Arc<PriceCatalog>,
        ledger: Arc<BudgetLedger>,
        allow_list: ModelAllowList,
        tokenizer: Arc<dyn TokenCounter>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        info!(
            provider = provider.name(),
            ceiling = ledger.ceiling(),
            models = catalog.len(),
            prefixes = allow_list.prefixes().len(),
            "admission controller initialized"
        );
        Self {
            catalog,
            ledger,
            allow_list,
            tokenizer,
            provider,
        }
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Handle one chat completion request.
    ///
    /// `authorization` is the raw `Authorization` header and `body` the raw
    /// request body; both are inspected here so the budget gate and the
    /// credential check run before the body is parsed.
    pub async fn handle(
        &self,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<ChatResponse, QuotaError> {
        let mut stage = Stage::Received;
        let result = self.run(&mut stage, authorization, body).await;
        if let Err(e) = &result {
            // Upstream failures are logged at the dispatch site with the estimate.
            if !matches!(e, QuotaError::Upstream { .. }) {
                warn!(stage = %stage, kind = %e.kind(), error = %e, "request rejected");
            }
        }
        result
    }

    async fn run(
        &self,
        stage: &mut Stage,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<ChatResponse, QuotaError> {
        self.ledger.check_not_exhausted()?;

        let credential = credential::bearer_token(authorization)?;
        *stage = Stage::Authorized;

        let request: ChatRequest =
            serde_json::from_slice(body).map_err(|e| QuotaError::MalformedRequest {
                message: format!("missing or invalid JSON data in request: {e}"),
            })?;
        self.allow_list.check(&request.model)?;

        let estimated_prompt_tokens =
            count_message_tokens(self.tokenizer.as_ref(), &request.messages, &request.model);
        let estimated_cost = self
            .catalog
            .calculate_cost(estimated_prompt_tokens, 0, &request.model);
        let admitted = self.ledger.try_admit(estimated_cost)?;
        *stage = Stage::Admitted;
        debug!(
            model = request.model.as_str(),
            prompt_tokens = estimated_prompt_tokens,
            estimated_cost,
            total_spent = admitted.total_spent,
            "request admitted"
        );

        let mut response = match self.provider.complete(&request, credential).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    stage = %stage,
                    model = request.model.as_str(),
                    prompt_tokens = estimated_prompt_tokens,
                    estimated_cost,
                    error = %e,
                    "upstream call failed, estimated cost not charged"
                );
                return Err(e);
            }
        };
        *stage = Stage::Dispatched;

        let (prompt_tokens, completion_tokens) = self.reconcile(&request, &response);
        let cost = self
            .catalog
            .calculate_cost(prompt_tokens, completion_tokens, &request.model);
        let committed = self.ledger.commit(cost);
        *stage = Stage::Reconciled;

        info!(
            model = request.model.as_str(),
            prompt_tokens,
            completion_tokens,
            cost_usd = cost,
            total_spent = committed.total_spent,
            remaining = committed.remaining,
            "request completed"
        );

        response.proxy_usage = Some(ProxyUsage {
            prompt_tokens,
            completion_tokens,
            cost_usd: round_usd(cost),
        });
        Ok(response)
    }

    /// Final token counts: upstream usage when both counts are reported,
    /// otherwise a local recount of prompt and completion.
    fn reconcile(&self, request: &ChatRequest, response: &ChatResponse) -> (u64, u64) {
        let usage = response.usage;
        if usage.prompt_tokens > 0 && usage.completion_tokens > 0 {
            return (usage.prompt_tokens, usage.completion_tokens);
        }

        let prompt_tokens =
            count_message_tokens(self.tokenizer.as_ref(), &request.messages, &request.model);
        let completion_tokens = self
            .tokenizer
            .count_tokens(&response.completion_text(), &request.model);
        debug!(
            reported_prompt = usage.prompt_tokens,
            reported_completion = usage.completion_tokens,
            prompt_tokens,
            completion_tokens,
            "upstream usage incomplete, recounted locally"
        );
        (prompt_tokens, completion_tokens)
    }

    /// Current ceiling, spend, and catalog keys.
    pub fn status(&self) -> StatusSnapshot {
        let ledger = self.ledger.snapshot();
        let available_models: Vec<String> =
            self.catalog.keys().into_iter().map(str::to_string).collect();
        StatusSnapshot {
            info: STATUS_INFO.to_string(),
            cost_limit: ledger.ceiling,
            current_cost: ledger.total_spent,
            remaining: ledger.remaining,
            models_count: available_models.len(),
            available_models,
        }
    }

    /// The full catalog, keyed and ordered by catalog key.
    pub fn pricing(&self) -> BTreeMap<String, PriceEntry> {
        self.catalog
            .entries()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quotagate_core::{ChatMessage, Choice, ErrorKind, Usage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One token per byte.
    struct ByteCounter;

    impl TokenCounter for ByteCounter {
        fn count_tokens(&self, text: &str, _model: &str) -> u64 {
            text.len() as u64
        }
    }

    struct EchoProvider {
        usage: Usage,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: &ChatRequest,
            _credential: &str,
        ) -> Result<ChatResponse, QuotaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResponse {
                id: "chatcmpl-test".into(),
                model: request.model.clone(),
                choices: vec![Choice {
                    message: ChatMessage::new("assistant", "abcd"),
                    ..Choice::default()
                }],
                usage: self.usage,
                ..ChatResponse::default()
            })
        }
    }

    fn controller(ceiling: f64, usage: Usage) -> (AdmissionController, Arc<EchoProvider>) {
        let catalog = Arc::new(PriceCatalog::from_entries([PriceEntry::new(
            "gpt-4o", 2.5, 10.0,
        )]));
        let provider = Arc::new(EchoProvider {
            usage,
            calls: AtomicUsize::new(0),
        });
        let controller = AdmissionController::new(
            Arc::clone(&catalog),
            Arc::new(BudgetLedger::new(ceiling)),
            ModelAllowList::from_catalog(&catalog),
            Arc::new(ByteCounter),
            provider.clone(),
        );
        (controller, provider)
    }

    const BODY: &[u8] = br#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#;

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Received.to_string(), "received");
        assert_eq!(Stage::Authorized.to_string(), "authorized");
        assert_eq!(Stage::Admitted.to_string(), "admitted");
        assert_eq!(Stage::Dispatched.to_string(), "dispatched");
        assert_eq!(Stage::Reconciled.to_string(), "reconciled");
    }

    #[tokio::test]
    async fn reported_usage_is_preferred() {
        let usage = Usage {
            prompt_tokens: 1000,
            completion_tokens: 500,
            total_tokens: 1500,
        };
        let (controller, provider) = controller(2.0, usage);
        let response = controller.handle(Some("Bearer k"), BODY).await.unwrap();
        let proxy = response.proxy_usage.unwrap();
        assert_eq!((proxy.prompt_tokens, proxy.completion_tokens), (1000, 500));
        assert_eq!(proxy.cost_usd, 0.0075);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!((controller.ledger().total_spent() - 0.0075).abs() < 1e-12);
    }

    #[tokio::test]
    async fn missing_usage_is_recounted_locally() {
        let (controller, _) = controller(2.0, Usage::default());
        let response = controller.handle(Some("Bearer k"), BODY).await.unwrap();
        let proxy = response.proxy_usage.unwrap();
        // "user" + "hi" = 6 bytes, + 3 per message + 3 priming.
        assert_eq!(proxy.prompt_tokens, 12);
        assert_eq!(proxy.completion_tokens, 4);
    }

    #[tokio::test]
    async fn one_zero_count_triggers_full_recount() {
        let usage = Usage {
            prompt_tokens: 999,
            completion_tokens: 0,
            total_tokens: 999,
        };
        let (controller, _) = controller(2.0, usage);
        let response = controller.handle(Some("Bearer k"), BODY).await.unwrap();
        let proxy = response.proxy_usage.unwrap();
        assert_eq!((proxy.prompt_tokens, proxy.completion_tokens), (12, 4));
    }

    #[tokio::test]
    async fn malformed_body_after_auth() {
        let (controller, provider) = controller(2.0, Usage::default());
        let err = controller
            .handle(Some("Bearer k"), b"invalid json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRequest);

        let err = controller.handle(None, b"invalid json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn status_reports_ledger_and_catalog() {
        let (controller, _) = controller(2.0, Usage::default());
        controller.ledger().commit(0.5);
        let status = controller.status();
        assert_eq!(status.info, STATUS_INFO);
        assert_eq!(status.cost_limit, 2.0);
        assert_eq!(status.current_cost, 0.5);
        assert_eq!(status.remaining, 1.5);
        assert_eq!(status.available_models, vec!["gpt-4o".to_string()]);
        assert_eq!(status.models_count, 1);
    }

    #[test]
    fn pricing_dump_is_sorted_by_key() {
        let (controller, _) = controller(2.0, Usage::default());
        let pricing = controller.pricing();
        assert_eq!(pricing.keys().collect::<Vec<_>>(), vec!["gpt-4o"]);
        assert_eq!(pricing["gpt-4o"].output, 10.0);
    }
}
