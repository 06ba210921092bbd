//! Simulation event log
//!
//! Every state transition the scheduler performs is recorded as an event,
//! giving a complete, serializable history of a scenario run. Events are
//! self-contained (all data needed to interpret them is inline) and the
//! log is append-only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A field-level simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldEvent {
    /// A field entered its growing season.
    Sown {
        date: NaiveDate,
        field: String,
        crop: String,
        harvest_date: NaiveDate,
        /// Irrigated area committed by the pre-season LP (ha)
        irrigated_area: f64,
    },

    /// Water was applied to a field from one source.
    IrrigationApplied {
        date: NaiveDate,
        field: String,
        source: String,
        volume_ml: f64,
        /// Application cost posted for this volume (dollars)
        cost: f64,
    },

    /// A field reached its harvest date.
    Harvested {
        date: NaiveDate,
        field: String,
        crop: String,
        net_income: f64,
        irrigated_area: f64,
    },
}

/// Append-only log of simulation events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<FieldEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&mut self, event: FieldEvent) {
        self.events.push(event);
    }

    /// All events in insertion order.
    pub fn events(&self) -> &[FieldEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
