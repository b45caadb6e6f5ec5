// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quotagate cost-capped completion proxy.
//!
//! This crate provides the error type, the chat completion wire types, and
//! the collaborator traits (token counting, upstream completion) that the
//! admission controller is written against.

pub mod error;
pub mod tokenizer;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, QuotaError};
pub use tokenizer::{TiktokenCounter, count_message_tokens};
pub use traits::{CompletionProvider, TokenCounter};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, ProxyUsage, Usage};
