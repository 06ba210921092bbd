//! Cropped field model: soil-water balance and season state
//!
//! A field owns its soil-water-deficit ledger, the crop rotation, the
//! committed irrigated area for the current season, and a per-source record
//! of irrigation volumes and costs. The deficit is stored as a non-negative
//! shortfall in mm (0 = saturated to target), clamped to `[0, TAW]` and
//! rounded to 4 decimal places on every update.
//!
//! # Season lifecycle
//!
//! A field is created once per zone. When the scheduler detects the crop's
//! plant date it calls [`CropField::begin_season`]; at harvest it calls
//! [`CropField::set_next_crop`] followed by [`CropField::reset_state`].
//! Soil state persists across crops; season markers and irrigation ledgers
//! do not.

use crate::core::consts::ML_TO_MM;
use crate::core::math::{round4, snap_zero};
use crate::models::crop::Crop;
use crate::models::irrigation::IrrigationSystem;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field under a crop rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropField {
    /// Field name, unique within a zone
    name: String,

    /// Total field area in hectares
    total_area_ha: f64,

    /// Installed irrigation system
    irrigation: IrrigationSystem,

    /// Crop rotation list; never empty
    crop_rotation: Vec<Crop>,

    /// Index of the active crop, advanced modulo the rotation length
    rotation_index: usize,

    /// Total available water capacity of the soil profile (mm)
    soil_taw: f64,

    /// Soil water deficit (mm); 0 = saturated to target, positive = dry
    soil_swd: f64,

    /// Irrigated area committed for the current season (ha); `None` until
    /// the pre-season allocation has been decided
    irrigated_area: Option<f64>,

    /// Irrigation volume applied this season, by water source (ML)
    irrigated_volume: BTreeMap<String, f64>,

    /// Running sum of water application costs this season (dollars)
    irrigation_cost: f64,

    /// Season markers
    sowed: bool,
    harvested: bool,
    plant_date: Option<NaiveDate>,
    harvest_date: Option<NaiveDate>,
}

impl CropField {
    /// Create a field with the given rotation and initial soil state.
    ///
    /// # Panics
    ///
    /// Panics if the rotation is empty or TAW is negative.
    pub fn new(
        name: String,
        total_area_ha: f64,
        irrigation: IrrigationSystem,
        crop_rotation: Vec<Crop>,
        soil_taw: f64,
        initial_swd: f64,
    ) -> Self {
        assert!(
            !crop_rotation.is_empty(),
            "field {name} requires at least one crop in rotation"
        );
        assert!(soil_taw >= 0.0, "soil TAW cannot be negative");

        Self {
            name,
            total_area_ha,
            irrigation,
            crop_rotation,
            rotation_index: 0,
            soil_taw,
            soil_swd: round4(initial_swd).clamp(0.0, soil_taw),
            irrigated_area: None,
            irrigated_volume: BTreeMap::new(),
            irrigation_cost: 0.0,
            sowed: false,
            harvested: false,
            plant_date: None,
            harvest_date: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_area_ha(&self) -> f64 {
        self.total_area_ha
    }

    pub fn irrigation(&self) -> &IrrigationSystem {
        &self.irrigation
    }

    /// The active crop in the rotation.
    pub fn crop(&self) -> &Crop {
        &self.crop_rotation[self.rotation_index]
    }

    pub fn soil_taw(&self) -> f64 {
        self.soil_taw
    }

    /// Current soil water deficit (mm, non-negative).
    pub fn soil_swd(&self) -> f64 {
        self.soil_swd
    }

    /// Irrigated area committed for the season; `None` until decided.
    pub fn irrigated_area(&self) -> Option<f64> {
        self.irrigated_area
    }

    /// Area not under irrigation this season.
    pub fn dryland_area_ha(&self) -> f64 {
        self.total_area_ha - self.irrigated_area.unwrap_or(0.0)
    }

    pub fn sowed(&self) -> bool {
        self.sowed
    }

    pub fn harvested(&self) -> bool {
        self.harvested
    }

    pub fn plant_date(&self) -> Option<NaiveDate> {
        self.plant_date
    }

    /// Harvest date; absent until the season start has been detected.
    /// Callers must treat absence as "not yet in season", not an error.
    pub fn harvest_date(&self) -> Option<NaiveDate> {
        self.harvest_date
    }

    /// Running sum of water application costs this season (dollars).
    ///
    /// This is a plain running sum, not a weighted average.
    pub fn irrigation_cost(&self) -> f64 {
        self.irrigation_cost
    }

    // ------------------------------------------------------------------
    // Soil water balance
    // ------------------------------------------------------------------

    /// Apply one day of rainfall and evapotranspiration to the deficit.
    ///
    /// `swd = clamp(round4(swd - (rainfall - et)), 0, TAW)`. The clamp is
    /// applied last so a fractional TAW is never exceeded by rounding.
    /// Holds for any inputs: rainfall exceeding the deficit clamps to 0,
    /// ET far exceeding rainfall clamps to TAW.
    pub fn update_deficit(&mut self, rainfall_mm: f64, et_mm: f64) {
        let new_swd = self.soil_swd - (rainfall_mm - et_mm);
        self.soil_swd = snap_zero(round4(new_swd).clamp(0.0, self.soil_taw));
    }

    /// Net irrigation depth (mm): the deficit threshold below which
    /// irrigation is not yet warranted, for the crop stage active on `date`.
    pub fn net_irrigation_depth(&self, date: NaiveDate) -> f64 {
        let crop = self.crop();
        let effective_root_depth = crop.root_depth_m * crop.effective_root_zone;
        effective_root_depth * (self.soil_taw * crop.depletion_fraction_on(date))
    }

    /// Gross water application required on `date` (mm).
    ///
    /// Zero while the deficit has not crossed the net-irrigation-depth
    /// trigger; otherwise the deficit scaled up by delivery losses.
    pub fn required_water(&self, date: NaiveDate) -> f64 {
        if self.soil_swd - self.net_irrigation_depth(date) < 0.0 {
            return 0.0;
        }
        round4(self.soil_swd / self.irrigation.efficiency)
    }

    /// Today's gross requirement expressed in ML per hectare.
    pub fn required_water_ml_per_ha(&self, date: NaiveDate) -> f64 {
        self.required_water(date) / ML_TO_MM
    }

    /// Area (ha) a volume budget could fully irrigate at today's per-ha
    /// requirement, capped at `candidate_area_ha`.
    ///
    /// A zero budget irrigates nothing; a zero requirement means the whole
    /// candidate area needs no water and is returned in full.
    pub fn possible_irrigated_area(
        &self,
        date: NaiveDate,
        vol_ml: f64,
        candidate_area_ha: f64,
    ) -> f64 {
        if snap_zero(vol_ml) <= 0.0 {
            return 0.0;
        }

        let req_ml_ha = self.required_water_ml_per_ha(date);
        if snap_zero(req_ml_ha) == 0.0 {
            return candidate_area_ha;
        }

        (vol_ml / req_ml_ha).min(candidate_area_ha)
    }

    /// Absorb an applied gross irrigation depth into the soil profile.
    ///
    /// Only the delivered fraction (gross x efficiency) reduces the
    /// deficit; the result stays clamped to `[0, TAW]`.
    pub fn absorb_irrigation(&mut self, gross_depth_mm: f64) {
        let delivered = gross_depth_mm * self.irrigation.efficiency;
        self.soil_swd = snap_zero(round4(self.soil_swd - delivered).clamp(0.0, self.soil_taw));
    }

    // ------------------------------------------------------------------
    // Season state
    // ------------------------------------------------------------------

    /// Commit the season's irrigated area (from the pre-season LP).
    pub fn set_irrigated_area(&mut self, area_ha: f64) {
        self.irrigated_area = Some(area_ha);
    }

    /// Mark the season started on `plant_date` and derive the harvest date
    /// from the crop's stage table.
    pub fn begin_season(&mut self, plant_date: NaiveDate) -> NaiveDate {
        let harvest = self.crop().season_end(plant_date);
        self.plant_date = Some(plant_date);
        self.harvest_date = Some(harvest);
        self.sowed = true;
        harvest
    }

    pub fn mark_harvested(&mut self) {
        self.harvested = true;
    }

    /// Advance the rotation to the next crop (wrapping at the end).
    pub fn set_next_crop(&mut self) {
        self.rotation_index = (self.rotation_index + 1) % self.crop_rotation.len();
    }

    /// Clear season markers and irrigation ledgers for the next season.
    ///
    /// Soil water deficit deliberately persists across crops.
    pub fn reset_state(&mut self) {
        self.sowed = false;
        self.harvested = false;
        self.plant_date = None;
        self.harvest_date = None;
        self.irrigated_area = None;
        self.irrigated_volume.clear();
        self.irrigation_cost = 0.0;
    }

    // ------------------------------------------------------------------
    // Irrigation accounting
    // ------------------------------------------------------------------

    /// Add an applied volume (ML) to one source's seasonal ledger.
    pub fn add_to_source(&mut self, source_name: &str, vol_ml: f64) {
        *self
            .irrigated_volume
            .entry(source_name.to_string())
            .or_insert(0.0) += vol_ml;
    }

    /// Reset every source's seasonal ledger entry to `value`.
    pub fn reset_all_sources(&mut self, value: f64) {
        for vol in self.irrigated_volume.values_mut() {
            *vol = value;
        }
    }

    /// Volume applied from one source this season (ML).
    pub fn volume_from_source(&self, source_name: &str) -> f64 {
        self.irrigated_volume.get(source_name).copied().unwrap_or(0.0)
    }

    /// Total volume applied this season across all sources (ML).
    pub fn total_irrigated_volume(&self) -> f64 {
        self.irrigated_volume.values().sum()
    }

    /// Per-source seasonal volumes (ML), ordered by source name.
    pub fn irrigated_volumes(&self) -> &BTreeMap<String, f64> {
        &self.irrigated_volume
    }

    /// Accumulate a water application cost (running sum).
    pub fn record_cost(&mut self, amount: f64) {
        self.irrigation_cost += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crop::GrowthStage;
    use crate::models::infrastructure::{Infrastructure, MaintenanceRate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

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
            efficiency: 0.5,
            flow_ml_day: 12.0,
            head_pressure: 8.0,
        }
    }

    fn wheat() -> Crop {
        Crop {
            name: "Wheat".to_string(),
            crop_type: "cereal".to_string(),
            plant_month: 5,
            plant_day: 15,
            growth_stages: vec![(
                "initial".to_string(),
                GrowthStage {
                    stage_length: 160,
                    depletion_fraction: 0.4,
                },
            )],
            yield_per_ha: 3.5,
            price_per_yield: 180.0,
            variable_cost_per_ha: 100.0,
            water_use_ml_per_ha: 3.0,
            root_depth_m: 1.0,
            et_coef: 110.0,
            wue_coef: 20.0,
            rainfall_threshold: 350.0,
            ssm_coef: 0.3,
            effective_root_zone: 0.5,
        }
    }

    fn field() -> CropField {
        CropField::new(
            "field1".to_string(),
            100.0,
            gravity(),
            vec![wheat()],
            100.0,
            30.0,
        )
    }

    #[test]
    fn test_deficit_clamps_to_zero_on_heavy_rain() {
        let mut f = field();
        f.update_deficit(500.0, 5.0);
        assert_eq!(f.soil_swd(), 0.0);
    }

    #[test]
    fn test_deficit_clamps_to_taw_under_sustained_et() {
        let mut f = field();
        f.update_deficit(0.0, 500.0);
        assert_eq!(f.soil_swd(), 100.0);
    }

    #[test]
    fn test_deficit_clamp_holds_for_fractional_taw() {
        // A TAW with more than 4 decimal places: rounding the clamped value
        // upward must not push the stored deficit past TAW
        let taw = 11.334667649041299;
        let mut f = CropField::new(
            "field1".to_string(),
            100.0,
            gravity(),
            vec![wheat()],
            taw,
            0.0,
        );

        f.update_deficit(0.0, 42.59230117068201);
        assert!(f.soil_swd() <= taw);
        assert_eq!(f.soil_swd(), taw);
    }

    #[test]
    fn test_deficit_rounding() {
        let mut f = field();
        f.update_deficit(0.123456, 0.0);
        assert_eq!(f.soil_swd(), 29.8765);
    }

    #[test]
    fn test_required_water_below_trigger_is_zero() {
        let f = field();
        // NID = (1.0 * 0.5) * (100 * 0.4) = 20; swd 30 > 20, so irrigation
        // is warranted: 30 / 0.5 = 60 mm gross
        assert_eq!(f.required_water(date(1981, 6, 1)), 60.0);

        let mut wet = field();
        wet.update_deficit(15.0, 0.0); // swd 15 < NID 20
        assert_eq!(wet.required_water(date(1981, 6, 1)), 0.0);
    }

    #[test]
    fn test_possible_irrigated_area() {
        let f = field();
        let d = date(1981, 6, 1);
        // requirement is 60 mm = 0.6 ML/ha
        assert_eq!(f.possible_irrigated_area(d, 0.0, 100.0), 0.0);
        assert!((f.possible_irrigated_area(d, 30.0, 100.0) - 50.0).abs() < 1e-9);
        assert_eq!(f.possible_irrigated_area(d, 600.0, 100.0), 100.0);

        // zero requirement: the whole candidate area needs no water
        let mut wet = field();
        wet.update_deficit(500.0, 0.0);
        assert_eq!(wet.possible_irrigated_area(d, 30.0, 80.0), 80.0);
    }

    #[test]
    fn test_source_ledger_additivity() {
        let mut f = field();
        f.add_to_source("surface_water", 12.5);
        f.add_to_source("groundwater", 7.5);
        f.add_to_source("surface_water", 2.0);

        assert_eq!(f.volume_from_source("surface_water"), 14.5);
        assert_eq!(f.total_irrigated_volume(), 22.0);

        f.reset_all_sources(0.0);
        assert_eq!(f.total_irrigated_volume(), 0.0);
    }

    #[test]
    fn test_rotation_advances_modulo_length() {
        let mut barley = wheat();
        barley.name = "Barley".to_string();
        let mut f = CropField::new(
            "field1".to_string(),
            100.0,
            gravity(),
            vec![wheat(), barley],
            100.0,
            30.0,
        );

        assert_eq!(f.crop().name, "Wheat");
        f.set_next_crop();
        assert_eq!(f.crop().name, "Barley");
        f.set_next_crop();
        assert_eq!(f.crop().name, "Wheat");
    }

    #[test]
    fn test_reset_state_preserves_soil() {
        let mut f = field();
        f.begin_season(date(1981, 5, 15));
        f.set_irrigated_area(80.0);
        f.add_to_source("surface_water", 10.0);
        f.record_cost(55.0);

        f.reset_state();

        assert!(!f.sowed());
        assert!(f.harvest_date().is_none());
        assert!(f.irrigated_area().is_none());
        assert_eq!(f.total_irrigated_volume(), 0.0);
        assert_eq!(f.irrigation_cost(), 0.0);
        assert_eq!(f.soil_swd(), 30.0);
    }

    #[test]
    fn test_begin_season_derives_harvest_date() {
        let mut f = field();
        let harvest = f.begin_season(date(1981, 5, 15));
        assert_eq!(harvest, date(1981, 5, 15) + chrono::Duration::days(160));
        assert_eq!(f.harvest_date(), Some(harvest));
        assert!(f.sowed());
    }

    #[test]
    fn test_absorb_irrigation_applies_efficiency() {
        let mut f = field();
        // 40 mm gross at 0.5 efficiency delivers 20 mm
        f.absorb_irrigation(40.0);
        assert_eq!(f.soil_swd(), 10.0);

        // cannot go below zero
        f.absorb_irrigation(400.0);
        assert_eq!(f.soil_swd(), 0.0);
    }
}
