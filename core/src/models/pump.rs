//! Pump model and pumping-cost calculation
//!
//! Pumping cost per ML follows the standard power formula
//! `P(kW) = (H * Q) / (102 * Ep * D)` with H the head pressure in metres,
//! Q the flow in litres per second, Ep the pump efficiency, and D the
//! derating factor (the 102 constant per Vellotti & Kalogernis, 2013).

use crate::core::consts::LITRES_PER_ML;
use crate::core::math::approx_zero;
use crate::models::infrastructure::Infrastructure;
use serde::{Deserialize, Serialize};

/// A pump attached to a water source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pump {
    /// Maintenance schedule and capital cost
    pub infrastructure: Infrastructure,

    /// Pump efficiency (0-1), nominally 0.7
    pub pump_efficiency: f64,

    /// Energy cost in dollars per kW
    pub cost_per_kw: f64,

    /// Derating factor accounting for losses between pump-shaft energy and
    /// total energy required, nominally 0.75
    pub derating: f64,
}

impl Pump {
    /// Maintenance cost due in the given yearly timestep.
    pub fn maintenance_cost(&self, year_step: usize) -> f64 {
        self.infrastructure.maintenance_cost(year_step)
    }

    /// Cost in dollars to pump one ML at the given flow rate and total head.
    ///
    /// Returns 0 for a non-positive flow rate. A negative result indicates
    /// a defect in the inputs (negative head or efficiency), not a
    /// recoverable condition.
    ///
    /// # Arguments
    /// * `flow_rate_lps` - flow rate in litres per second
    /// * `head_pressure_m` - total head pressure in metres, including any
    ///   additional head from the irrigation system
    pub fn pumping_cost_per_ml(&self, flow_rate_lps: f64, head_pressure_m: f64) -> f64 {
        if flow_rate_lps <= 0.0 {
            return 0.0;
        }

        const POWER_CONSTANT: f64 = 102.0;
        let energy_required_kw = (head_pressure_m * flow_rate_lps)
            / ((POWER_CONSTANT * self.pump_efficiency) * self.derating);

        let hours_per_ml = (LITRES_PER_ML / flow_rate_lps) / 60.0 / 60.0;

        let cost_per_hour = self.cost_per_kw * energy_required_kw;
        let cost_per_ml = cost_per_hour * hours_per_ml;

        assert!(
            cost_per_ml > 0.0 || approx_zero(cost_per_ml),
            "pumping cost cannot be negative ({cost_per_ml}): flow {flow_rate_lps} L/s, head {head_pressure_m} m"
        );

        cost_per_ml
    }
}
