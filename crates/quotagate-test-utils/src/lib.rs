// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Quotagate integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock upstream with queued responses, failure mode, and an in-flight barrier
//! - [`FixedTokenCounter`] - Token counter returning a constant per text
//! - [`TestHarness`] - Admission controller over an in-memory catalog

pub mod counter;
pub mod harness;
pub mod mock_provider;

pub use counter::FixedTokenCounter;
pub use harness::{chat_body, test_catalog, TestHarness, TEST_AUTHORIZATION};
pub use mock_provider::{MockProvider, DEFAULT_MOCK_USAGE};
