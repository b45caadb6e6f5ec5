// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic token counter for tests that need exact token arithmetic.

use quotagate_core::TokenCounter;

/// Counts every non-empty text as a fixed number of tokens.
#[derive(Debug, Clone, Copy)]
pub struct FixedTokenCounter(pub u64);

impl TokenCounter for FixedTokenCounter {
    fn count_tokens(&self, text: &str, _model: &str) -> u64 {
        if text.is_empty() { 0 } else { self.0 }
    }
}
