// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost accounting for the Quotagate proxy.
//!
//! This crate provides:
//! - **Price catalog**: per-model rates loaded from a CSV source, with exact and prefix lookup
//! - **Pricing**: token-count to USD conversion against a resolved catalog entry
//! - **Budget ledger**: the single shared spend counter checked against the ceiling

pub mod budget;
pub mod catalog;
pub mod pricing;

pub use budget::{BudgetLedger, LedgerSnapshot};
pub use catalog::{PriceCatalog, PriceEntry};
pub use pricing::{calculate_cost, round_usd};
