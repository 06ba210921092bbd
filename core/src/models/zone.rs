//! Farm zone: the unit of LP optimization
//!
//! A zone is a named collection of fields and water sources sharing one
//! allocation ledger. All fields and sources within a zone compete for
//! area and water inside a single solve, which is why the in-season LP
//! considers the whole zone rather than one field at a time.

use crate::allocation::AllocationLedger;
use crate::models::field::CropField;
use crate::models::water_source::WaterSource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised when assembling a zone
#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("field names must be unique within a zone (duplicate: {0})")]
    DuplicateFieldName(String),

    #[error("no allocation entry for water source {0}")]
    MissingAllocation(String),
}

/// A farm zone under simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmZone {
    /// Zone name
    name: String,

    /// Fields in the zone
    fields: Vec<CropField>,

    /// Water sources the zone can draw from
    water_sources: Vec<WaterSource>,

    /// Remaining allocation per source (ML)
    ledger: AllocationLedger,
}

impl FarmZone {
    /// Assemble a zone, validating field-name uniqueness and that every
    /// water source has a ledger entry.
    pub fn new(
        name: String,
        fields: Vec<CropField>,
        water_sources: Vec<WaterSource>,
        ledger: AllocationLedger,
    ) -> Result<Self, ZoneError> {
        let mut seen = HashSet::new();
        for f in &fields {
            if !seen.insert(f.name().to_string()) {
                return Err(ZoneError::DuplicateFieldName(f.name().to_string()));
            }
        }

        for ws in &water_sources {
            if ledger.available(&ws.name).is_err() {
                return Err(ZoneError::MissingAllocation(ws.name.clone()));
            }
        }

        Ok(Self {
            name,
            fields,
            water_sources,
            ledger,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[CropField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [CropField] {
        &mut self.fields
    }

    pub fn water_sources(&self) -> &[WaterSource] {
        &self.water_sources
    }

    pub fn ledger(&self) -> &AllocationLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AllocationLedger {
        &mut self.ledger
    }

    /// Total zone area in hectares.
    pub fn total_area_ha(&self) -> f64 {
        self.fields.iter().map(|f| f.total_area_ha()).sum()
    }

    /// Total committed irrigated area across fields (ha).
    pub fn irrigated_area(&self) -> f64 {
        self.fields
            .iter()
            .filter_map(|f| f.irrigated_area())
            .sum()
    }

    /// Total water remaining across all sources (ML).
    pub fn avail_allocation(&self) -> f64 {
        self.ledger.available_total()
    }

    /// True when every field in the zone has been harvested.
    pub fn all_fields_harvested(&self) -> bool {
        self.fields.iter().all(|f| f.harvested())
    }
}
