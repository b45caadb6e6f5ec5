// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global spending ledger with a fixed USD ceiling.
//!
//! The ledger keeps a single in-memory running total shared by every
//! request. Admission checks and commits each take the lock for one short
//! critical section; nothing holds it across an await point. Two requests
//! admitted back to back may together push the total past the ceiling,
//! since commits happen after the upstream call. That overshoot is bounded
//! by the number of requests in flight.
//!
//! It emits a `tracing::warn` the first time spend crosses 80% of the
//! ceiling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use quotagate_core::QuotaError;
use serde::Serialize;
use tracing::{debug, warn};

/// Fraction of the ceiling at which a warning is logged.
const WARN_FRACTION: f64 = 0.8;

/// Point-in-time view of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub ceiling: f64,
    pub total_spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Default)]
struct LedgerState {
    total_spent: f64,
    warned: bool,
}

impl LedgerState {
    fn is_exhausted(&self, ceiling: f64) -> bool {
        self.total_spent >= ceiling
    }

    fn would_exceed(&self, estimated_cost: f64, ceiling: f64) -> bool {
        self.total_spent + estimated_cost >= ceiling
    }
}

/// Process-wide budget ledger.
#[derive(Debug)]
pub struct BudgetLedger {
    ceiling: f64,
    state: Mutex<LedgerState>,
}

impl BudgetLedger {
    /// Create a ledger with zero spend.
    pub fn new(ceiling: f64) -> Self {
        Self::with_total_spent(ceiling, 0.0)
    }

    /// Create a ledger that starts from an existing spend total.
    pub fn with_total_spent(ceiling: f64, total_spent: f64) -> Self {
        Self {
            ceiling,
            state: Mutex::new(LedgerState {
                total_spent,
                warned: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // The state is two plain fields; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn total_spent(&self) -> f64 {
        self.lock().total_spent
    }

    /// Ceiling minus spend. Negative after an overshoot.
    pub fn remaining(&self) -> f64 {
        self.ceiling - self.total_spent()
    }

    /// Whether adding `estimated_cost` would reach or pass the ceiling.
    pub fn would_exceed(&self, estimated_cost: f64) -> bool {
        self.lock().would_exceed(estimated_cost, self.ceiling)
    }

    /// Whether spend has already reached the ceiling.
    pub fn is_exhausted(&self) -> bool {
        self.lock().is_exhausted(self.ceiling)
    }

    /// Fail with [`QuotaError::BudgetExhausted`] once spend has reached the ceiling.
    pub fn check_not_exhausted(&self) -> Result<(), QuotaError> {
        self.ensure_not_exhausted(&self.lock())
    }

    fn ensure_not_exhausted(&self, state: &LedgerState) -> Result<(), QuotaError> {
        if state.is_exhausted(self.ceiling) {
            return Err(QuotaError::BudgetExhausted {
                total_spent: state.total_spent,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    /// Admission check for a request with the given pre-flight estimate.
    ///
    /// Both the exhaustion check and the estimate check read the same total
    /// under one lock. Nothing is reserved: the caller commits the actual
    /// cost later with [`BudgetLedger::commit`].
    pub fn try_admit(&self, estimated_cost: f64) -> Result<LedgerSnapshot, QuotaError> {
        let state = self.lock();
        self.ensure_not_exhausted(&state)?;
        if state.would_exceed(estimated_cost, self.ceiling) {
            return Err(QuotaError::BudgetWouldBeExceeded {
                estimated_cost,
                total_spent: state.total_spent,
                ceiling: self.ceiling,
            });
        }
        Ok(self.snapshot_of(&state))
    }

    /// Add an actual cost to the running total.
    pub fn commit(&self, cost: f64) -> LedgerSnapshot {
        let mut state = self.lock();
        state.total_spent += cost;
        let snapshot = self.snapshot_of(&state);

        if !state.warned && snapshot.total_spent >= self.ceiling * WARN_FRACTION {
            state.warned = true;
            warn!(
                total_spent = snapshot.total_spent,
                ceiling = self.ceiling,
                "approaching global cost limit (80%+)"
            );
        }
        debug!(
            cost,
            total_spent = snapshot.total_spent,
            remaining = snapshot.remaining,
            "committed request cost"
        );
        snapshot
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.snapshot_of(&self.lock())
    }

    fn snapshot_of(&self, state: &LedgerState) -> LedgerSnapshot {
        LedgerSnapshot {
            ceiling: self.ceiling,
            total_spent: state.total_spent,
            remaining: self.ceiling - state.total_spent,
        }
    }
}
