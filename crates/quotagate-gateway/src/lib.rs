// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the Quotagate proxy.
//!
//! The gateway translates HTTP requests into calls on the
//! [`AdmissionController`](quotagate_admission::AdmissionController) and
//! maps each error kind to a status code with a JSON error body.

pub mod handlers;
pub mod server;

pub use handlers::{status_for, ApiError, ErrorResponse};
pub use server::{build_router, start_server, GatewayState, ServerConfig};
