// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting trait.

/// Counts tokens in a piece of text for a given model.
///
/// Must be deterministic and total: an unknown model falls back to some
/// encoding rather than failing. Counts may be approximate.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str, model: &str) -> u64;
}
