// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with pre-configured
//! responses, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Barrier, Mutex};

use quotagate_core::{
    ChatMessage, ChatRequest, ChatResponse, Choice, CompletionProvider, QuotaError, Usage,
};

/// Usage reported by default: 10 prompt and 20 completion tokens.
pub const DEFAULT_MOCK_USAGE: Usage = Usage {
    prompt_tokens: 10,
    completion_tokens: 20,
    total_tokens: 30,
};

/// A mock upstream that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    usage: Usage,
    failure: Option<String>,
    barrier: Option<Arc<Barrier>>,
    calls: AtomicUsize,
    last_credential: Mutex<Option<String>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            usage: DEFAULT_MOCK_USAGE,
            failure: None,
            barrier: None,
            calls: AtomicUsize::new(0),
            last_credential: Mutex::new(None),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Report this usage block on every response.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Fail every call with an upstream error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Hold every call at `barrier` before responding, so tests can keep
    /// several requests in flight at once.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Number of times `complete` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The credential passed on the most recent call.
    pub async fn last_credential(&self) -> Option<String> {
        self.last_credential.lock().await.clone()
    }

    /// Pop the next response, or return the default.
    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn complete(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<ChatResponse, QuotaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credential.lock().await = Some(credential.to_string());

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(message) = &self.failure {
            return Err(QuotaError::upstream(message.clone()));
        }

        let text = self.next_response().await;
        Ok(ChatResponse {
            id: format!("chatcmpl-mock-{}", self.call_count()),
            object: "chat.completion".to_string(),
            created: 0,
            model: request.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::new("assistant", text),
                finish_reason: Some("stop".to_string()),
                extra: Default::default(),
            }],
            usage: self.usage,
            proxy_usage: None,
            extra: Default::default(),
        })
    }
}
