//! Water source model
//!
//! A water source couples a fee structure (per-ML usage fee, per-ha area
//! fee, fixed yearly fee) with the pump needed to extract from it and the
//! head the pump must overcome. The remaining extractable volume for the
//! period lives in the zone's [`AllocationLedger`](crate::AllocationLedger),
//! not here.

use crate::models::pump::Pump;
use serde::{Deserialize, Serialize};

/// A source of water available to a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSource {
    /// Source name (e.g. "surface_water", "groundwater")
    pub name: String,

    /// Static head in metres between the source and the field
    pub head: f64,

    /// Usage fee in dollars per ML extracted
    pub cost_per_ml: f64,

    /// Access fee in dollars per hectare irrigated from this source
    pub cost_per_ha: f64,

    /// Fixed yearly fee in dollars
    pub yearly_costs: f64,

    /// Pump used to extract from this source
    pub pump: Pump,
}

impl WaterSource {
    /// Cost to pump one ML from this source at the given flow rate,
    /// using the source's own head only.
    pub fn pump_cost_per_ml(&self, flow_rate_lps: f64) -> f64 {
        self.pump.pumping_cost_per_ml(flow_rate_lps, self.head)
    }

    /// Usage fees for the given extracted volume.
    pub fn usage_costs(&self, water_used_ml: f64) -> f64 {
        self.cost_per_ml * water_used_ml
    }

    /// Total seasonal costs: yearly fee + usage fees + area fees.
    pub fn total_costs(&self, area_ha: f64, water_used_ml: f64) -> f64 {
        self.yearly_costs + self.usage_costs(water_used_ml) + self.cost_per_ha * area_ha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::infrastructure::{Infrastructure, MaintenanceRate};

    fn source() -> WaterSource {
        WaterSource {
            name: "groundwater".to_string(),
            head: 25.0,
            cost_per_ml: 20.0,
            cost_per_ha: 5.0,
            yearly_costs: 100.0,
            pump: Pump {
                infrastructure: Infrastructure {
                    name: "deeplead".to_string(),
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
                pump_efficiency: 0.7,
                cost_per_kw: 0.28,
                derating: 0.75,
            },
        }
    }

    #[test]
    fn test_usage_costs() {
        assert_eq!(source().usage_costs(10.0), 200.0);
    }

    #[test]
    fn test_total_costs() {
        // yearly 100 + usage 20*10 + area 5*50
        assert_eq!(source().total_costs(50.0, 10.0), 100.0 + 200.0 + 250.0);
    }
}
