//! Domain types for the farm simulation.

pub mod crop;
pub mod field;
pub mod infrastructure;
pub mod irrigation;
pub mod pump;
pub mod water_source;
pub mod zone;

pub use crop::{Crop, GrowthStage};
pub use field::CropField;
pub use infrastructure::Infrastructure;
pub use irrigation::IrrigationSystem;
pub use pump::Pump;
pub use water_source::WaterSource;
pub use zone::{FarmZone, ZoneError};
