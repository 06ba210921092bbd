//! Farm Simulator Core - Rust Engine
//!
//! Daily-timestep simulator of irrigated farm zones with deterministic
//! execution. Soil moisture depletes under evapotranspiration, replenishes
//! under rainfall and irrigation, and at decision points a profit-maximizing
//! allocation of a scarce multi-source water budget is computed and applied.
//!
//! # Architecture
//!
//! - **core**: Calendar/time management, unit constants, numeric conventions
//! - **models**: Domain types (Crop, CropField, WaterSource, FarmZone)
//! - **allocation**: Per-zone water allocation ledger
//! - **climate**: Climate data provider contract and in-memory table
//! - **config**: Declarative specification loading and parameter resolution
//! - **optimizer**: LP formulations for area and water-source allocation
//! - **scheduler**: Main daily simulation loop
//! - **events**: Append-only simulation event log
//!
//! # Critical Invariants
//!
//! 1. Soil water deficit is a non-negative shortfall in mm, clamped to
//!    `[0, TAW]` and rounded to 4 decimal places on every update
//! 2. Water source allocations never go negative; a debit that would
//!    underflow is a fatal error, never clamped
//! 3. Values within floating tolerance of zero are snapped to exactly 0
//!    before being stored or compared
//! 4. LP solves are stateless: the model is rebuilt from live state on
//!    every call and identical state yields identical primal values

// Module declarations
pub mod allocation;
pub mod climate;
pub mod config;
pub mod core;
pub mod events;
pub mod models;
pub mod optimizer;
pub mod scheduler;

// Re-exports for convenience
pub use crate::core::consts::ML_TO_MM;
pub use crate::core::math::{round4, snap_zero, TOLERANCE};
pub use crate::core::time::SimClock;
pub use allocation::{AllocationError, AllocationLedger};
pub use climate::{ClimateError, ClimateProvider, ClimateTable};
pub use config::{SpecError, ZoneSpec};
pub use events::{EventLog, FieldEvent};
pub use models::{
    crop::{Crop, GrowthStage},
    field::CropField,
    infrastructure::Infrastructure,
    irrigation::IrrigationSystem,
    pump::Pump,
    water_source::WaterSource,
    zone::{FarmZone, ZoneError},
};
pub use optimizer::{Manager, OptimizerError};
pub use scheduler::{DayResult, HarvestReport, SimulationError, ZoneScheduler};
