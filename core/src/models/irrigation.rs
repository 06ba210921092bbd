//! Irrigation system model
//!
//! The irrigation system determines delivery efficiency (fraction of gross
//! application reaching the root zone), the achievable flow rate, and the
//! additional head pressure the pump must work against. A field with the
//! "dryland" system receives no irrigation and is pinned to zero in the
//! in-season allocation LP.

use crate::core::consts::{LITRES_PER_ML, SECONDS_PER_DAY};
use crate::models::infrastructure::Infrastructure;
use serde::{Deserialize, Serialize};

/// Name of the no-irrigation system.
pub const DRYLAND: &str = "dryland";

/// An irrigation delivery system installed on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSystem {
    /// Maintenance schedule and capital cost
    pub infrastructure: Infrastructure,

    /// Delivery efficiency (0-1): fraction of applied water reaching the
    /// root zone
    pub efficiency: f64,

    /// Achievable flow in ML per day
    pub flow_ml_day: f64,

    /// Additional head pressure in metres imposed by the system
    pub head_pressure: f64,
}

impl IrrigationSystem {
    /// System name.
    pub fn name(&self) -> &str {
        &self.infrastructure.name
    }

    /// True when this is the no-irrigation ("dryland") system.
    pub fn is_dryland(&self) -> bool {
        self.infrastructure.name == DRYLAND
    }

    /// Flow rate in litres per second.
    pub fn flow_rate_lps(&self) -> f64 {
        (self.flow_ml_day * LITRES_PER_ML) / SECONDS_PER_DAY
    }

    /// Maintenance cost due in the given yearly timestep.
    pub fn maintenance_cost(&self, year_step: usize) -> f64 {
        self.infrastructure.maintenance_cost(year_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::infrastructure::MaintenanceRate;

    fn gravity() -> IrrigationSystem {
        IrrigationSystem {
            infrastructure: Infrastructure {
                name: "Gravity".to_string(),
                capital_cost_per_ha: 2000.0,
                minor_maintenance: MaintenanceRate {
                    interval_years: 1,
                    rate: 0.05,
                },
                major_maintenance: MaintenanceRate {
                    interval_years: 5,
                    rate: 0.2,
                },
                implemented: true,
            },
            efficiency: 0.6,
            flow_ml_day: 12.0,
            head_pressure: 8.0,
        }
    }

    #[test]
    fn test_flow_rate_conversion() {
        let sys = gravity();
        // 12 ML/day = 12e6 L / 86400 s
        assert!((sys.flow_rate_lps() - 138.888_888_9).abs() < 1e-6);
    }

    #[test]
    fn test_dryland_detection() {
        let mut sys = gravity();
        assert!(!sys.is_dryland());
        sys.infrastructure.name = DRYLAND.to_string();
        assert!(sys.is_dryland());
    }
}
