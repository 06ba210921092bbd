//! Zone scheduler - main daily simulation loop
//!
//! Orchestrates one simulated day at a time: climate application, season
//! state transitions, allocation optimization, ledger updates, and harvest
//! income computation.
//!
//! See `engine.rs` for the full implementation.

pub mod engine;

pub use engine::{DayResult, HarvestReport, SimulationError, ZoneScheduler};
