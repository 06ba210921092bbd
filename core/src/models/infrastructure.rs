//! Periodic maintenance-cost model for farm infrastructure
//!
//! Pumps and irrigation systems share the same maintenance schedule shape:
//! a capital cost per hectare, a minor maintenance interval/rate, and a
//! major maintenance interval/rate. Costs are pure functions of the yearly
//! timestep; no optimization logic lives here.

use serde::{Deserialize, Serialize};

/// A maintenance schedule entry: every `interval_years`, charge
/// `rate` x capital cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRate {
    /// Interval in years between maintenance events
    pub interval_years: usize,

    /// Fraction of the capital cost charged per event
    pub rate: f64,
}

/// Generic farm infrastructure with periodic maintenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    /// Infrastructure name (e.g. "Gravity", "surface_water pump")
    pub name: String,

    /// Capital cost in dollars per hectare
    pub capital_cost_per_ha: f64,

    /// Minor maintenance schedule
    pub minor_maintenance: MaintenanceRate,

    /// Major maintenance schedule
    pub major_maintenance: MaintenanceRate,

    /// Whether the infrastructure is currently implemented
    pub implemented: bool,
}

impl Infrastructure {
    /// Minor maintenance cost per event.
    pub fn minor_maintenance_cost(&self) -> f64 {
        self.capital_cost_per_ha * self.minor_maintenance.rate
    }

    /// Major maintenance cost per event.
    pub fn major_maintenance_cost(&self) -> f64 {
        self.capital_cost_per_ha * self.major_maintenance.rate
    }

    /// Maintenance cost due in the given yearly timestep.
    ///
    /// The major interval is checked first: a year divisible by both
    /// intervals charges only the major cost, never the sum of both.
    pub fn maintenance_cost(&self, year_step: usize) -> f64 {
        if self.major_maintenance.interval_years > 0
            && year_step % self.major_maintenance.interval_years == 0
        {
            self.major_maintenance_cost()
        } else if self.minor_maintenance.interval_years > 0
            && year_step % self.minor_maintenance.interval_years == 0
        {
            self.minor_maintenance_cost()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infra() -> Infrastructure {
        Infrastructure {
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
        }
    }

    #[test]
    fn test_minor_maintenance_year() {
        let i = infra();
        assert_eq!(i.maintenance_cost(3), 2000.0 * 0.05);
    }

    #[test]
    fn test_major_wins_when_both_intervals_coincide() {
        let i = infra();
        // Year 5 is divisible by both intervals: charge only the major cost
        assert_eq!(i.maintenance_cost(5), 2000.0 * 0.2);
        assert_eq!(i.maintenance_cost(10), 2000.0 * 0.2);
    }

    #[test]
    fn test_no_maintenance_year() {
        let mut i = infra();
        i.minor_maintenance.interval_years = 3;
        assert_eq!(i.maintenance_cost(4), 0.0);
    }
}
