//! Zone scheduler engine
//!
//! Drives the per-field season state machine once per simulated day:
//!
//! ```text
//! PRE_SEASON -> SOWN_TODAY -> IN_SEASON -> HARVEST_DAY
//!      ^                                       |
//!      +------ next crop in rotation <---------+
//! ```
//!
//! For each day:
//! 1. Apply rainfall/ET to every field's soil balance (unconditionally,
//!    before any allocation decision - deficits feed the day's
//!    required-water figures)
//! 2. Sowing: fields whose crop plant date is today get a harvest date,
//!    and the pre-season area LP commits their irrigated area
//! 3. In-season: the source-mix LP splits each field's requirement across
//!    sources; allocations are debited and soil deficits reduced
//! 4. Harvest: gross income from the French-Schultz yield estimate minus
//!    seasonal costs; the field advances to the next crop in rotation
//! 5. Advance the clock (the yearly step increments on Dec 31)
//!
//! Any optimizer, allocation, or climate error aborts the timestep and is
//! propagated unchanged; nothing is retried with relaxed bounds.

use crate::allocation::AllocationError;
use crate::climate::{ClimateError, ClimateProvider};
use crate::core::consts::ML_TO_MM;
use crate::core::math::snap_zero;
use crate::core::time::{matches_month_day, SimClock};
use crate::events::{EventLog, FieldEvent};
use crate::models::zone::FarmZone;
use crate::optimizer::{Manager, OptimizerError};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days of antecedent rainfall considered when estimating stored soil
/// moisture at harvest accounting time (one quarter).
const ANTECEDENT_WINDOW_DAYS: i64 = 90;

/// Simulation error types
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Climate(#[from] ClimateError),
}

/// End-of-season result record for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub date: NaiveDate,
    pub field: String,
    pub crop: String,
    /// Gross income minus seasonal costs (dollars)
    pub net_income: f64,
    /// Irrigated area committed for the season (ha)
    pub irrigated_area: f64,
}

/// Result of a single simulated day.
#[derive(Debug, Clone, Default)]
pub struct DayResult {
    /// The day that was processed
    pub date: NaiveDate,

    /// Fields that entered their season today
    pub fields_sown: usize,

    /// Fields that received irrigation today
    pub fields_irrigated: usize,

    /// Total water applied today across the zone (ML)
    pub water_applied_ml: f64,

    /// Fields harvested today
    pub harvests: Vec<HarvestReport>,
}

/// Per-field irrigation plan derived from the in-season LP, applied to the
/// ledgers after all plans are computed.
struct IrrigationPlan {
    field_index: usize,
    /// (source, volume ML, application cost $)
    applications: Vec<(String, f64, f64)>,
    /// Gross depth applied over the irrigated area (mm)
    gross_depth_mm: f64,
}

/// Drives one farm zone through simulated time.
///
/// Owns the zone, the decision manager, and the clock; the climate
/// provider is passed per call so one data set can serve many zones.
pub struct ZoneScheduler {
    zone: FarmZone,
    manager: Manager,
    clock: SimClock,
    event_log: EventLog,
    harvest_reports: Vec<HarvestReport>,
}

impl ZoneScheduler {
    pub fn new(zone: FarmZone, start_date: NaiveDate) -> Self {
        Self {
            zone,
            manager: Manager::new(),
            clock: SimClock::new(start_date),
            event_log: EventLog::new(),
            harvest_reports: Vec::new(),
        }
    }

    pub fn zone(&self) -> &FarmZone {
        &self.zone
    }

    pub fn zone_mut(&mut self) -> &mut FarmZone {
        &mut self.zone
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// All harvest reports collected so far.
    pub fn harvest_reports(&self) -> &[HarvestReport] {
        &self.harvest_reports
    }

    /// Process one simulated day, then advance the clock.
    pub fn run_timestep(
        &mut self,
        climate: &dyn ClimateProvider,
    ) -> Result<DayResult, SimulationError> {
        let date = self.clock.current_date();
        let year_step = self.clock.year_step();
        let mut result = DayResult {
            date,
            ..DayResult::default()
        };

        // Rainfall/ET applies to every field before any decision is made
        self.apply_climate(climate, date)?;

        result.fields_sown = self.process_sowing(date, year_step)?;
        self.process_irrigation(date, year_step, &mut result)?;
        result.harvests = self.process_harvests(climate, date, year_step)?;

        self.clock.advance_day();
        Ok(result)
    }

    /// Apply the day's rainfall and evapotranspiration to every field.
    fn apply_climate(
        &mut self,
        climate: &dyn ClimateProvider,
        date: NaiveDate,
    ) -> Result<(), SimulationError> {
        for field in self.zone.fields_mut() {
            let rainfall = climate.rainfall_on(field.name(), date)?;
            let et = climate.et_on(field.name(), date)?;
            field.update_deficit(rainfall, et);
        }
        Ok(())
    }

    /// Detect season starts and commit irrigated areas via the pre-season
    /// LP. Returns the number of fields sown.
    fn process_sowing(
        &mut self,
        date: NaiveDate,
        year_step: usize,
    ) -> Result<usize, SimulationError> {
        let sowing: Vec<usize> = self
            .zone
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.harvest_date().is_none()
                    && matches_month_day(date, f.crop().plant_month, f.crop().plant_day)
            })
            .map(|(i, _)| i)
            .collect();

        if sowing.is_empty() {
            return Ok(0);
        }

        for &i in &sowing {
            self.zone.fields_mut()[i].begin_season(date);
        }

        // One solve covers the whole zone: fields compete for the same
        // allocation pool
        let primals = self.manager.optimize_irrigated_area(&self.zone, year_step)?;
        let source_names: Vec<String> = self
            .zone
            .water_sources()
            .iter()
            .map(|ws| ws.name.clone())
            .collect();

        for &i in &sowing {
            let field = &self.zone.fields()[i];
            let committed: f64 = source_names
                .iter()
                .map(|s| {
                    primals
                        .get(&Manager::var_id(field.name(), s))
                        .copied()
                        .unwrap_or(0.0)
                })
                .sum();

            let event = FieldEvent::Sown {
                date,
                field: field.name().to_string(),
                crop: field.crop().name.clone(),
                harvest_date: field.harvest_date().expect("season just began"),
                irrigated_area: committed,
            };

            self.zone.fields_mut()[i].set_irrigated_area(snap_zero(committed));
            self.event_log.record(event);
        }

        Ok(sowing.len())
    }

    /// Run the in-season mix LP and apply its output to the allocation
    /// ledger and each field's soil balance.
    fn process_irrigation(
        &mut self,
        date: NaiveDate,
        year_step: usize,
        result: &mut DayResult,
    ) -> Result<(), SimulationError> {
        let active: Vec<usize> = self
            .zone
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                let in_window = match (f.plant_date(), f.harvest_date()) {
                    (Some(plant), Some(harvest)) => plant < date && date < harvest,
                    _ => false,
                };
                in_window
                    && f.sowed()
                    && !f.irrigation().is_dryland()
                    && snap_zero(f.irrigated_area().unwrap_or(0.0)) > 0.0
                    && snap_zero(f.required_water(date)) > 0.0
            })
            .map(|(i, _)| i)
            .collect();

        if active.is_empty() {
            return Ok(());
        }

        let mix = self.manager.optimize_irrigation(&self.zone, date, year_step)?;
        let source_names: Vec<String> = self
            .zone
            .water_sources()
            .iter()
            .map(|ws| ws.name.clone())
            .collect();

        // Plan every field's applications before mutating any ledger
        let mut plans: Vec<IrrigationPlan> = Vec::new();
        for &i in &active {
            let field = &self.zone.fields()[i];
            let committed = field.irrigated_area().expect("active field has an area");
            let req_ml_ha = field.required_water_ml_per_ha(date);
            let proportions = Manager::perc_irrigation_sources(field, &source_names, &mix.primals);

            let mut applications = Vec::new();
            let mut total_vol = 0.0;
            for source in &source_names {
                let vol = snap_zero(req_ml_ha * committed * proportions[source]);
                if vol <= 0.0 {
                    continue;
                }
                let cost_per_ml = mix.app_cost_per_ml[&Manager::var_id(field.name(), source)];
                applications.push((source.clone(), vol, vol * cost_per_ml));
                total_vol += vol;
            }

            if applications.is_empty() {
                continue;
            }

            plans.push(IrrigationPlan {
                field_index: i,
                applications,
                gross_depth_mm: (total_vol / committed) * ML_TO_MM,
            });
        }

        for plan in plans {
            let field_name = self.zone.fields()[plan.field_index].name().to_string();
            let mut field_total = 0.0;

            for (source, vol, cost) in &plan.applications {
                // An underflow here means the LP's bounds disagreed with
                // the ledger; abort the timestep
                self.zone.ledger_mut().debit(source, *vol)?;

                let field = &mut self.zone.fields_mut()[plan.field_index];
                field.add_to_source(source, *vol);
                field.record_cost(*cost);
                field_total += vol;

                self.event_log.record(FieldEvent::IrrigationApplied {
                    date,
                    field: field_name.clone(),
                    source: source.clone(),
                    volume_ml: *vol,
                    cost: *cost,
                });
            }

            self.zone.fields_mut()[plan.field_index].absorb_irrigation(plan.gross_depth_mm);

            result.fields_irrigated += 1;
            result.water_applied_ml += field_total;
        }

        Ok(())
    }

    /// Settle fields whose harvest date is today: estimate yields, compute
    /// net income, and cycle each to the next crop in its rotation.
    fn process_harvests(
        &mut self,
        climate: &dyn ClimateProvider,
        date: NaiveDate,
        year_step: usize,
    ) -> Result<Vec<HarvestReport>, SimulationError> {
        let harvesting: Vec<usize> = self
            .zone
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.sowed() && f.harvest_date() == Some(date))
            .map(|(i, _)| i)
            .collect();

        let mut reports = Vec::new();
        for i in harvesting {
            let report = self.settle_harvest(climate, date, year_step, i)?;

            self.event_log.record(FieldEvent::Harvested {
                date,
                field: report.field.clone(),
                crop: report.crop.clone(),
                net_income: report.net_income,
                irrigated_area: report.irrigated_area,
            });

            let field = &mut self.zone.fields_mut()[i];
            field.mark_harvested();
            field.set_next_crop();
            field.reset_state();

            self.harvest_reports.push(report.clone());
            reports.push(report);
        }

        Ok(reports)
    }

    /// Compute one field's end-of-season net income.
    fn settle_harvest(
        &self,
        climate: &dyn ClimateProvider,
        date: NaiveDate,
        year_step: usize,
        field_index: usize,
    ) -> Result<HarvestReport, SimulationError> {
        let field = &self.zone.fields()[field_index];
        let crop = field.crop();
        let plant_date = field.plant_date().expect("harvesting field was sown");

        // Growing-season rainfall and antecedent stored soil moisture
        let gsr = climate.seasonal_rainfall(plant_date, date, field.name())?;
        let antecedent = climate.seasonal_rainfall(
            plant_date - Duration::days(ANTECEDENT_WINDOW_DAYS),
            plant_date - Duration::days(1),
            field.name(),
        )?;
        let ssm = antecedent * crop.ssm_coef;

        let irrigated_area = field.irrigated_area().unwrap_or(0.0);
        let dryland_area = field.dryland_area_ha();
        let total_volume = field.total_irrigated_volume();

        let irrigation_depth_mm = if irrigated_area > 0.0 {
            (total_volume / irrigated_area) * ML_TO_MM
        } else {
            0.0
        };

        let irrigated_yield = crop.potential_yield_t_ha(ssm, gsr + irrigation_depth_mm);
        let dryland_yield = crop.potential_yield_t_ha(ssm, gsr);

        let gross_income = irrigated_yield * crop.price_per_yield * irrigated_area
            + dryland_yield * crop.price_per_yield * dryland_area;

        // Seasonal costs: maintenance, crop costs, and the accumulated
        // application cost. Per-ML usage fees are already inside the
        // application cost posted per irrigation event, so they are not
        // charged again here.
        let pump_maintenance: f64 = self
            .zone
            .water_sources()
            .iter()
            .map(|ws| ws.pump.maintenance_cost(year_step))
            .sum();
        let irrigation_maintenance = field.irrigation().maintenance_cost(year_step);
        let crop_costs = crop.variable_cost_per_ha * field.total_area_ha();

        let total_costs =
            pump_maintenance + irrigation_maintenance + crop_costs + field.irrigation_cost();

        Ok(HarvestReport {
            date,
            field: field.name().to_string(),
            crop: crop.name.clone(),
            net_income: gross_income - total_costs,
            irrigated_area,
        })
    }
}
