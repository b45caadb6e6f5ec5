// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request admission for the Quotagate proxy.
//!
//! The [`AdmissionController`] is the central coordinator that:
//! - Rejects every request once the global budget is spent
//! - Checks the caller's bearer credential and the requested model
//! - Estimates prompt cost and admits or rejects against the ceiling
//! - Dispatches to the upstream provider and commits the reconciled cost

pub mod allowlist;
pub mod controller;
pub mod credential;

pub use allowlist::{ModelAllowList, FALLBACK_MODEL_PREFIXES};
pub use controller::{AdmissionController, Stage, StatusSnapshot};
pub use credential::bearer_token;
