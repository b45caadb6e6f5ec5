// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the admission controller depends on.
//!
//! Both collaborators are injected as trait objects so the controller can be
//! driven by mocks in tests and by real implementations in the binary.

pub mod provider;
pub mod tokenizer;

pub use provider::CompletionProvider;
pub use tokenizer::TokenCounter;
