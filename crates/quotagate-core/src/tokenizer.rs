// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BPE token counting backed by `tiktoken-rs`.
//!
//! The encoding is chosen from the model name; models tiktoken does not know
//! fall back to `cl100k_base`, so counting never fails.

use tiktoken_rs::{CoreBPE, tokenizer};
use tracing::debug;

use crate::traits::TokenCounter;
use crate::types::ChatMessage;

/// Tokens added per message for the role/content framing.
const TOKENS_PER_MESSAGE: u64 = 3;

/// Tokens added once per prompt to prime the assistant reply.
const REPLY_PRIMING_TOKENS: u64 = 3;

/// [`TokenCounter`] using the OpenAI BPE encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiktokenCounter;

impl TiktokenCounter {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str, model: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        bpe_for_model(model).encode_ordinary(text).len() as u64
    }
}

fn bpe_for_model(model: &str) -> &'static CoreBPE {
    let tokenizer = tokenizer::get_tokenizer(model).unwrap_or_else(|| {
        debug!(model, "no tiktoken encoding for model, using cl100k_base");
        tokenizer::Tokenizer::Cl100kBase
    });
    match tokenizer {
        tokenizer::Tokenizer::O200kHarmony => tiktoken_rs::o200k_harmony_singleton(),
        tokenizer::Tokenizer::O200kBase => tiktoken_rs::o200k_base_singleton(),
        tokenizer::Tokenizer::Cl100kBase => tiktoken_rs::cl100k_base_singleton(),
        tokenizer::Tokenizer::R50kBase => tiktoken_rs::r50k_base_singleton(),
        tokenizer::Tokenizer::P50kBase => tiktoken_rs::p50k_base_singleton(),
        tokenizer::Tokenizer::P50kEdit => tiktoken_rs::p50k_edit_singleton(),
        tokenizer::Tokenizer::Gpt2 => tiktoken_rs::r50k_base_singleton(),
    }
}

/// Count prompt tokens for a list of chat messages.
///
/// Each message contributes the tokens of `role + name + content` plus a
/// fixed framing overhead, and the prompt as a whole adds the reply priming.
/// An empty message list therefore counts as [`REPLY_PRIMING_TOKENS`].
pub fn count_message_tokens(
    counter: &dyn TokenCounter,
    messages: &[ChatMessage],
    model: &str,
) -> u64 {
    let content: u64 = messages
        .iter()
        .map(|msg| {
            let mut text = String::with_capacity(
                msg.role.len() + msg.name.as_deref().map_or(0, str::len) + msg.text().len(),
            );
            text.push_str(&msg.role);
            text.push_str(msg.name.as_deref().unwrap_or_default());
            text.push_str(msg.text());
            counter.count_tokens(&text, model)
        })
        .sum();

    content + TOKENS_PER_MESSAGE * messages.len() as u64 + REPLY_PRIMING_TOKENS
}
