//! Crop model and phenology
//!
//! A crop has a recurring yearly plant date (month/day), an ordered table of
//! growth stages, and a set of static economic coefficients used by yield
//! and income estimation.
//!
//! Phenology is deliberately forgiving: a date outside the defined season
//! range resolves to the "initial" (first) stage rather than raising an
//! error, since deficit accounting runs year-round while the stage table
//! only covers the growing season.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Coefficients for one growth stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthStage {
    /// Stage duration in days (non-negative)
    pub stage_length: i64,

    /// Fraction of total available water the crop can deplete before
    /// stress during this stage
    pub depletion_fraction: f64,
}

impl Default for GrowthStage {
    /// Degenerate stage used when a crop has no growth-stage table.
    fn default() -> Self {
        Self {
            stage_length: 0,
            depletion_fraction: 0.0,
        }
    }
}

/// A crop in a field's rotation.
///
/// Economic coefficients are immutable reference data; the only seasonal
/// state a crop carries is implied by the calendar (its recurring plant
/// month/day and stage windows derived from it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crop {
    /// Crop name (e.g. "Wheat")
    pub name: String,

    /// Broad crop type (e.g. "cereal")
    pub crop_type: String,

    /// Recurring planting date: month (1-12)
    pub plant_month: u32,

    /// Recurring planting date: day of month
    pub plant_day: u32,

    /// Ordered growth stages, "initial" first by convention
    pub growth_stages: Vec<(String, GrowthStage)>,

    /// Expected yield in tonnes per hectare
    pub yield_per_ha: f64,

    /// Price in dollars per tonne of yield
    pub price_per_yield: f64,

    /// Variable production cost in dollars per hectare
    pub variable_cost_per_ha: f64,

    /// Nominal seasonal water use in ML per hectare (pre-season estimate)
    pub water_use_ml_per_ha: f64,

    /// Root depth in metres
    pub root_depth_m: f64,

    /// French-Schultz evapotranspiration coefficient in mm
    pub et_coef: f64,

    /// French-Schultz water-use-efficiency coefficient (kg/ha/mm)
    pub wue_coef: f64,

    /// Rainfall above this threshold (mm) does not add to yield
    pub rainfall_threshold: f64,

    /// Weighting applied to antecedent rainfall when estimating stored
    /// soil moisture at season start (nominally 0.3)
    pub ssm_coef: f64,

    /// Fraction of the root zone considered effective for extraction
    pub effective_root_zone: f64,
}

impl Crop {
    /// Total season length in days (sum of stage durations).
    pub fn harvest_offset(&self) -> i64 {
        self.growth_stages.iter().map(|(_, s)| s.stage_length).sum()
    }

    /// Harvest date for a season planted on `plant_date`.
    ///
    /// With an empty stage table the season end equals the plant date.
    pub fn season_end(&self, plant_date: NaiveDate) -> NaiveDate {
        plant_date + Duration::days(self.harvest_offset())
    }

    /// Growth stage active on `date`.
    ///
    /// Stage windows are computed by walking the ordered stage list from the
    /// crop's recurring plant month/day, accumulating `stage_length` days
    /// per stage. Matching compares month/day only (year-agnostic) and
    /// handles seasons that wrap across the end of the calendar year. Dates
    /// outside every window, and crops with no stage table, resolve to the
    /// "initial" stage.
    pub fn stage_for(&self, date: NaiveDate) -> GrowthStage {
        let offset = self.season_day_offset(date);
        let mut cumulative = 0i64;
        for (_, stage) in &self.growth_stages {
            if offset < cumulative + stage.stage_length {
                return *stage;
            }
            cumulative += stage.stage_length;
        }

        self.initial_stage()
    }

    /// Depletion fraction of the stage active on `date`.
    pub fn depletion_fraction_on(&self, date: NaiveDate) -> f64 {
        self.stage_for(date).depletion_fraction
    }

    /// The "initial" stage (first in the table), or the degenerate default
    /// when no stage table is defined.
    pub fn initial_stage(&self) -> GrowthStage {
        self.growth_stages
            .first()
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    /// Days from the most recent occurrence of the plant month/day to
    /// `date` (0 on the plant day itself).
    fn season_day_offset(&self, date: NaiveDate) -> i64 {
        let plant_this_year = NaiveDate::from_ymd_opt(date.year(), self.plant_month, self.plant_day)
            .unwrap_or_else(|| {
                // Feb 29 plant date in a non-leap year resolves to Feb 28
                NaiveDate::from_ymd_opt(date.year(), self.plant_month, self.plant_day - 1)
                    .expect("valid recurring plant date")
            });

        if plant_this_year <= date {
            (date - plant_this_year).num_days()
        } else {
            let prev = NaiveDate::from_ymd_opt(date.year() - 1, self.plant_month, self.plant_day)
                .unwrap_or_else(|| {
                    NaiveDate::from_ymd_opt(date.year() - 1, self.plant_month, self.plant_day - 1)
                        .expect("valid recurring plant date")
                });
            (date - prev).num_days()
        }
    }

    /// Naive pre-season estimate of net income per hectare.
    pub fn estimate_income_per_ha(&self) -> f64 {
        (self.price_per_yield * self.yield_per_ha) - self.variable_cost_per_ha
    }

    /// French-Schultz potential yield in tonnes per hectare.
    ///
    /// # Arguments
    /// * `ssm_mm` - stored soil moisture carried into the season (mm)
    /// * `gsr_mm` - growing-season rainfall, including any irrigation
    ///   expressed as an equivalent depth (mm)
    pub fn potential_yield_t_ha(&self, ssm_mm: f64, gsr_mm: f64) -> f64 {
        let effective_rain = gsr_mm.min(self.rainfall_threshold);
        let yield_t = ((ssm_mm + effective_rain - self.et_coef) * self.wue_coef) / 1000.0;
        yield_t.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_stage_crop() -> Crop {
        Crop {
            name: "Wheat".to_string(),
            crop_type: "cereal".to_string(),
            plant_month: 5,
            plant_day: 15,
            growth_stages: vec![
                (
                    "initial".to_string(),
                    GrowthStage {
                        stage_length: 40,
                        depletion_fraction: 0.55,
                    },
                ),
                (
                    "development".to_string(),
                    GrowthStage {
                        stage_length: 120,
                        depletion_fraction: 0.4,
                    },
                ),
            ],
            yield_per_ha: 3.5,
            price_per_yield: 180.0,
            variable_cost_per_ha: 100.0,
            water_use_ml_per_ha: 3.0,
            root_depth_m: 1.0,
            et_coef: 110.0,
            wue_coef: 20.0,
            rainfall_threshold: 350.0,
            ssm_coef: 0.3,
            effective_root_zone: 0.55,
        }
    }

    #[test]
    fn test_harvest_date_arithmetic() {
        let crop = two_stage_crop();
        let plant = date(1981, 5, 15);

        assert_eq!(crop.harvest_offset(), 160);
        assert_eq!(crop.season_end(plant), plant + Duration::days(160));
    }

    #[test]
    fn test_stage_for_second_stage() {
        let crop = two_stage_crop();
        let plant = date(1981, 5, 15);

        // Day 41 of the season falls in the second stage, not the first
        let stage = crop.stage_for(plant + Duration::days(41));
        assert_eq!(stage.depletion_fraction, 0.4);

        // Day 39 is still in the initial stage
        let stage = crop.stage_for(plant + Duration::days(39));
        assert_eq!(stage.depletion_fraction, 0.55);
    }

    #[test]
    fn test_stage_for_out_of_season_falls_back_to_initial() {
        let crop = two_stage_crop();

        // Well past harvest (160 days): falls back to the initial stage
        let stage = crop.stage_for(date(1982, 3, 1));
        assert_eq!(stage.depletion_fraction, 0.55);
    }

    #[test]
    fn test_stage_for_year_agnostic() {
        let crop = two_stage_crop();

        // Same season day in a different year resolves to the same stage
        let a = crop.stage_for(date(1981, 7, 1));
        let b = crop.stage_for(date(1995, 7, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_stage_table_degenerates() {
        let mut crop = two_stage_crop();
        crop.growth_stages.clear();

        let plant = date(1981, 5, 15);
        assert_eq!(crop.season_end(plant), plant);
        assert_eq!(crop.stage_for(plant), GrowthStage::default());
    }

    #[test]
    fn test_season_wraps_calendar_year() {
        let mut crop = two_stage_crop();
        crop.plant_month = 11;
        crop.plant_day = 20;

        // Jan 5 is day 46 of a season planted Nov 20: second stage
        let stage = crop.stage_for(date(1982, 1, 5));
        assert_eq!(stage.depletion_fraction, 0.4);
    }

    #[test]
    fn test_potential_yield() {
        let crop = two_stage_crop();

        // (30 + min(300, 350) - 110) * 20 / 1000 = 4.4
        let y = crop.potential_yield_t_ha(30.0, 300.0);
        assert!((y - 4.4).abs() < 1e-9);

        // Rainfall above the threshold does not add to yield
        let capped = crop.potential_yield_t_ha(30.0, 900.0);
        let at_threshold = crop.potential_yield_t_ha(30.0, 350.0);
        assert_eq!(capped, at_threshold);

        // Dry season clamps at zero, never negative
        assert_eq!(crop.potential_yield_t_ha(0.0, 50.0), 0.0);
    }

    #[test]
    fn test_estimate_income_per_ha() {
        let crop = two_stage_crop();
        assert_eq!(crop.estimate_income_per_ha(), 3.5 * 180.0 - 100.0);
    }
}
