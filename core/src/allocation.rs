//! Water allocation ledger
//!
//! One ledger per zone, one entry per water source, tracking the remaining
//! extractable volume (ML) for the period.
//!
//! # Critical Invariants
//!
//! 1. Every entry is >= 0 at all times
//! 2. A debit that would drive an entry negative beyond floating tolerance
//!    fails with [`AllocationError::Underflow`] and leaves the ledger
//!    unchanged (atomicity). This signals a modeling bug - the LP's bounds
//!    disagreed with the physical ledger - and is never clamped or retried.
//! 3. Results within tolerance of zero are snapped to exactly 0
//!
//! Replenishment is an explicit external operation (e.g. at the start of a
//! water year via [`AllocationLedger::set_allocation`]); the ledger never
//! refills itself.

use crate::core::math::{round4, snap_zero, TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("unknown water source: {0}")]
    UnknownSource(String),

    // The field is named `source_name` rather than `source` so thiserror
    // does not treat it as an error-source chain
    #[error("allocation underflow for {source_name}: requested {requested} ML, available {available} ML")]
    Underflow {
        source_name: String,
        requested: f64,
        available: f64,
    },
}

/// Remaining extractable volume per water source (ML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationLedger {
    entries: BTreeMap<String, f64>,
}

impl AllocationLedger {
    /// Build a ledger from (source name, allocation ML) pairs.
    pub fn new(allocations: impl IntoIterator<Item = (String, f64)>) -> Self {
        let entries = allocations
            .into_iter()
            .map(|(name, vol)| (name, snap_zero(vol)))
            .collect();
        Self { entries }
    }

    /// Remaining allocation for one source (ML).
    pub fn available(&self, source: &str) -> Result<f64, AllocationError> {
        self.entries
            .get(source)
            .copied()
            .ok_or_else(|| AllocationError::UnknownSource(source.to_string()))
    }

    /// Total remaining allocation across all sources (ML), rounded.
    pub fn available_total(&self) -> f64 {
        round4(self.entries.values().sum())
    }

    /// Subtract a volume from one source's allocation.
    ///
    /// Results within tolerance of zero snap to exactly 0. A debit that
    /// would go negative beyond tolerance fails and leaves the ledger
    /// unchanged.
    pub fn debit(&mut self, source: &str, vol_ml: f64) -> Result<(), AllocationError> {
        let available = self.available(source)?;
        let remainder = available - vol_ml;

        if remainder < -TOLERANCE {
            return Err(AllocationError::Underflow {
                source_name: source.to_string(),
                requested: vol_ml,
                available,
            });
        }

        // entry existence checked above
        *self.entries.get_mut(source).expect("source exists") = snap_zero(remainder);
        Ok(())
    }

    /// Explicitly reset one source's allocation (start of a water year).
    pub fn set_allocation(&mut self, source: &str, vol_ml: f64) {
        self.entries.insert(source.to_string(), snap_zero(vol_ml));
    }

    /// Source names in deterministic (sorted) order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
