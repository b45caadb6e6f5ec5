// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the proxy REST API.
//!
//! Handles POST/GET on the chat completions routes, GET pricing, GET health.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use quotagate_admission::StatusSnapshot;
use quotagate_core::{ErrorKind, QuotaError};
use quotagate_cost::PriceEntry;
use serde::Serialize;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Response body for GET /pricing.
#[derive(Debug, Serialize)]
pub struct PricingResponse {
    pub pricing: BTreeMap<String, PriceEntry>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Machine-readable error kind.
    pub code: ErrorKind,
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::ModelNotAllowed | ErrorKind::MalformedRequest => StatusCode::BAD_REQUEST,
        ErrorKind::BudgetExhausted | ErrorKind::BudgetWouldBeExceeded => {
            StatusCode::TOO_MANY_REQUESTS
        }
        ErrorKind::UpstreamFailure
        | ErrorKind::ConfigurationLoadFailure
        | ErrorKind::Config
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wrapper turning a [`QuotaError`] into a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub QuotaError);

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: kind,
        };
        (status_for(kind), Json(body)).into_response()
    }
}

/// POST /v1/chat/completions
///
/// Runs the admission protocol and returns the upstream response with the
/// `proxy_usage` block attached.
pub async fn post_chat_completions(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    match state.controller.handle(authorization, &body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /v1/chat/completions
///
/// Budget and catalog status.
pub async fn get_info(State(state): State<GatewayState>) -> Json<StatusSnapshot> {
    Json(state.controller.status())
}

/// GET /pricing
pub async fn get_pricing(State(state): State<GatewayState>) -> Json<PricingResponse> {
    Json(PricingResponse {
        pricing: state.controller.pricing(),
    })
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
