// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat completions API.
//!
//! Provides [`OpenAiClient`] which handles request construction and
//! per-request bearer authentication. Each call is a single attempt: a
//! failed round trip is surfaced to the caller and never retried here.

use std::time::Duration;

use quotagate_core::{ChatRequest, ChatResponse, QuotaError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::ApiErrorResponse;

/// HTTP client for upstream chat completion calls.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `base_url` - Full chat completions endpoint URL
    /// * `timeout` - Whole-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QuotaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| QuotaError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a chat completion request with the caller's API key.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> Result<ChatResponse, QuotaError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| QuotaError::Upstream {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = request.model.as_str(), "completion response received");

        if status.is_success() {
            let body = response.text().await.map_err(|e| QuotaError::Upstream {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            let completion: ChatResponse =
                serde_json::from_str(&body).map_err(|e| QuotaError::Upstream {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                })?;
            return Ok(completion);
        }

        let body = response.text().await.unwrap_or_default();
        let error_msg = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
            format!(
                "API returned {status} ({}): {}",
                api_err.error.label(),
                api_err.error.message
            )
        } else {
            format!("API returned {status}: {body}")
        };
        Err(QuotaError::Upstream {
            message: error_msg,
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotagate_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest::new("gpt-4o", vec![ChatMessage::new("user", "Hello")])
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there!"},
                "finish_reason": "stop",
                "logprobs": null
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
            "system_fingerprint": "fp_test"
        })
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let result = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap();

        assert_eq!(result.id, "chatcmpl-test");
        assert_eq!(result.usage.prompt_tokens, 10);
        assert_eq!(result.usage.completion_tokens, 5);
        assert_eq!(result.completion_text(), "Hi there!");
        assert_eq!(result.extra["system_fingerprint"], "fp_test");
    }

    #[tokio::test]
    async fn null_usage_parses_as_zero() {
        let server = MockServer::start().await;
        let mut body = success_body();
        body["usage"] = serde_json::Value::Null;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let result = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap();
        assert_eq!(result.usage.prompt_tokens, 0);
        assert_eq!(result.usage.completion_tokens, 0);
        assert_eq!(result.completion_text(), "Hi there!");
    }

    #[tokio::test]
    async fn client_sends_bearer_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }

    #[tokio::test]
    async fn unknown_request_fields_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = test_request();
        request.extra.insert(
            "response_format".into(),
            serde_json::json!({"type": "json_object"}),
        );
        test_client(&server)
            .complete(&request, "sk-test-key")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_status_is_not_retried() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::Upstream { .. }));
        let msg = err.to_string();
        assert!(msg.contains("429"), "got: {msg}");
        assert!(msg.contains("Rate limit reached"), "got: {msg}");
    }

    #[tokio::test]
    async fn server_error_with_plain_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("Internal Server Error"), "got: {msg}");
    }

    #[tokio::test]
    async fn unparsable_success_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to parse API response"));
    }

    #[tokio::test]
    async fn connection_failure_is_upstream_error() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        drop(server);

        let err = client
            .complete(&test_request(), "sk-test-key")
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::Upstream { .. }));
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
