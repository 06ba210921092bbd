//! Allocation optimizer ("Manager")
//!
//! Formulates and solves the two linear programs of the irrigation-decision
//! engine:
//!
//! 1. **Pre-season area allocation** - at season start, how many hectares
//!    of each field should be committed to irrigation, and fed from which
//!    water source, to maximize estimated profit
//! 2. **In-season water-source mix** - on an irrigation day, how the day's
//!    required volume should be split across sources given remaining
//!    allocations and per-source pumping costs
//!
//! The optimizer is stateless: every call builds a fresh model (variables,
//! objective, constraints) from live zone/field/ledger state, because the
//! decision variables' bounds change every call. Identical state yields
//! identical primal values.
//!
//! Decision variables are identified by synthesized `"{field}__{source}"`
//! keys (spaces replaced by underscores); callers extract what they need
//! from the returned primal map and apply it explicitly - results are never
//! stored as zone or field state.

use crate::allocation::AllocationError;
use crate::core::math::snap_zero;
use crate::models::field::CropField;
use crate::models::zone::FarmZone;
use chrono::NaiveDate;
use good_lp::{
    constraint, default_solver, variable, variables, Constraint, Expression, Solution,
    SolverModel, Variable,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by the optimizer
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// The solver reported an infeasible or otherwise non-optimal status.
    /// Fatal for the current timestep; never retried with relaxed bounds.
    #[error("could not find an optimal allocation: {0}")]
    NotOptimal(String),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Result of the in-season water-source mix LP.
#[derive(Debug, Clone)]
pub struct IrrigationMix {
    /// Optimal area (ha) per `"{field}__{source}"` variable
    pub primals: BTreeMap<String, f64>,

    /// Derived water application cost ($/ML) per `"{field}__{source}"`
    /// pair: pumping cost at the combined head plus the source usage fee.
    /// Needed so the caller can post accurate cost entries.
    pub app_cost_per_ml: BTreeMap<String, f64>,
}

/// The farm decision manager.
#[derive(Debug, Default)]
pub struct Manager;

impl Manager {
    pub fn new() -> Self {
        Self
    }

    /// Synthesized decision-variable identifier for a (field, source) pair.
    pub fn var_id(field_name: &str, source_name: &str) -> String {
        format!("{field_name}__{source_name}").replace(' ', "_")
    }

    /// Pre-season optimal irrigated area per (field, water source).
    ///
    /// Each variable is bounded above by the smaller of the field's total
    /// area and the area the source's current allocation could physically
    /// irrigate at the crop's nominal per-ha water use. The objective
    /// maximizes estimated per-ha crop income net of water application and
    /// pump maintenance costs. Callers sum a field's source variables to
    /// get its committed irrigated area for the season.
    pub fn optimize_irrigated_area(
        &self,
        zone: &FarmZone,
        year_step: usize,
    ) -> Result<BTreeMap<String, f64>, OptimizerError> {
        let mut vars = variables!();
        let mut objective = Expression::from(0.0);
        let mut constraints: Vec<Constraint> = Vec::new();
        let mut handles: Vec<(String, Variable)> = Vec::new();
        let mut zone_sum = Expression::from(0.0);

        let total_pump_cost: f64 = zone
            .water_sources()
            .iter()
            .map(|ws| ws.pump.maintenance_cost(year_step))
            .sum();

        for field in zone.fields() {
            let area_to_consider = field.total_area_ha();
            let naive_income = field.crop().estimate_income_per_ha();
            let nominal_req_ml_ha = field.crop().water_use_ml_per_ha;

            let water_cost =
                self.ml_water_application_cost(zone, field, nominal_req_ml_ha);

            let mut field_sum = Expression::from(0.0);
            for ws in zone.water_sources() {
                let allocation = zone.ledger().available(&ws.name)?;
                let ub = if nominal_req_ml_ha > 0.0 {
                    area_to_consider.min(allocation / nominal_req_ml_ha)
                } else {
                    area_to_consider
                };

                let v = vars.add(variable().min(0.0).max(ub));
                objective += (naive_income - water_cost[&ws.name] - total_pump_cost) * v;
                field_sum += v;
                zone_sum += v;
                handles.push((Self::var_id(field.name(), &ws.name), v));
            }

            // Total irrigated area cannot exceed the field area
            constraints.push(constraint!(field_sum <= area_to_consider));
        }

        constraints.push(constraint!(zone_sum <= zone.total_area_ha()));

        Self::solve(vars, objective, constraints, handles)
    }

    /// In-season optimal split of required irrigation across sources.
    ///
    /// Fields that are dryland, have no committed irrigated area, or whose
    /// required water for `date` is zero have their variables pinned to 0
    /// rather than left unconstrained - this avoids spurious "irrigate
    /// anyway" solutions. For the rest, each source variable is bounded by
    /// the area that source's remaining allocation can irrigate at today's
    /// requirement, and the per-source water drawn across all fields is
    /// constrained by that source's available allocation.
    pub fn optimize_irrigation(
        &self,
        zone: &FarmZone,
        date: NaiveDate,
        year_step: usize,
    ) -> Result<IrrigationMix, OptimizerError> {
        let mut vars = variables!();
        let mut objective = Expression::from(0.0);
        let mut constraints: Vec<Constraint> = Vec::new();
        let mut handles: Vec<(String, Variable)> = Vec::new();
        let mut app_cost_per_ml = BTreeMap::new();
        let mut zone_sum = Expression::from(0.0);
        let mut source_water: BTreeMap<String, Expression> = BTreeMap::new();
        let mut active_fields = 0usize;

        let total_pump_cost: f64 = zone
            .water_sources()
            .iter()
            .map(|ws| ws.pump.maintenance_cost(year_step))
            .sum();

        for field in zone.fields() {
            let committed = field.irrigated_area().unwrap_or(0.0);
            let req_ml_ha = field.required_water_ml_per_ha(date);
            let flow_rate = field.irrigation().flow_rate_lps();
            let system_head = field.irrigation().head_pressure;

            for ws in zone.water_sources() {
                let cost_per_ml = ws.pump.pumping_cost_per_ml(flow_rate, ws.head + system_head)
                    + ws.cost_per_ml;
                app_cost_per_ml.insert(Self::var_id(field.name(), &ws.name), cost_per_ml);
            }

            let inactive = field.irrigation().is_dryland()
                || snap_zero(committed) == 0.0
                || snap_zero(req_ml_ha) == 0.0;

            if inactive {
                for ws in zone.water_sources() {
                    let v = vars.add(variable().min(0.0).max(0.0));
                    handles.push((Self::var_id(field.name(), &ws.name), v));
                }
                continue;
            }

            active_fields += 1;
            let area_to_consider = self.possible_area(zone, field, date)?;

            let maintenance =
                total_pump_cost + field.irrigation().maintenance_cost(year_step);
            let crop_income_per_ha = field.crop().yield_per_ha * field.crop().price_per_yield;
            let crop_cost_per_ha = field.crop().variable_cost_per_ha;

            let mut field_sum = Expression::from(0.0);
            for ws in zone.water_sources() {
                let id = Self::var_id(field.name(), &ws.name);
                let available = zone.ledger().available(&ws.name)?;
                let ub = area_to_consider.min(available / req_ml_ha);

                let cost_per_ha = req_ml_ha * app_cost_per_ml[&id] + crop_cost_per_ha;

                let v = vars.add(variable().min(0.0).max(ub.max(0.0)));
                objective += (crop_income_per_ha - cost_per_ha) * v;
                field_sum += v;
                zone_sum += v;
                let draw = source_water
                    .entry(ws.name.clone())
                    .or_insert_with(|| Expression::from(0.0));
                *draw += req_ml_ha * v;
                handles.push((id, v));
            }

            // Maintenance accrues regardless of the chosen mix
            objective -= maintenance;

            // Constrain by the season's committed irrigated area
            constraints.push(constraint!(field_sum <= committed));
        }

        // Nothing to irrigate today: every variable is pinned to zero, so
        // skip the solve rather than hand the solver a constant model
        if active_fields == 0 {
            let primals = handles.into_iter().map(|(id, _)| (id, 0.0)).collect();
            return Ok(IrrigationMix {
                primals,
                app_cost_per_ml,
            });
        }

        // Water drawn from each source cannot exceed its allocation
        for (source, water_expr) in source_water {
            let available = zone.ledger().available(&source)?;
            constraints.push(constraint!(water_expr <= available));
        }

        // Total irrigated area cannot exceed the zone area
        constraints.push(constraint!(zone_sum <= zone.total_area_ha()));

        let primals = Self::solve(vars, objective, constraints, handles)?;

        Ok(IrrigationMix {
            primals,
            app_cost_per_ml,
        })
    }

    /// Feasible irrigation area for a field given the zone's total
    /// remaining allocation and any already-committed irrigated area.
    pub fn possible_area(
        &self,
        zone: &FarmZone,
        field: &CropField,
        date: NaiveDate,
    ) -> Result<f64, OptimizerError> {
        let available_ml = zone.avail_allocation();
        let area = match field.irrigated_area() {
            None => field.total_area_ha(),
            Some(committed) => field.possible_irrigated_area(date, available_ml, committed),
        };
        Ok(area)
    }

    /// Water application cost in $/ha by source, for a given per-ha
    /// requirement: pumping cost at the source head plus the field's system
    /// head, scaled by the requirement.
    pub fn ml_water_application_cost(
        &self,
        zone: &FarmZone,
        field: &CropField,
        req_water_ml_ha: f64,
    ) -> BTreeMap<String, f64> {
        let flow_rate = field.irrigation().flow_rate_lps();
        let system_head = field.irrigation().head_pressure;

        zone.water_sources()
            .iter()
            .map(|ws| {
                let cost = ws.pump.pumping_cost_per_ml(flow_rate, ws.head + system_head)
                    * req_water_ml_ha;
                (ws.name.clone(), cost)
            })
            .collect()
    }

    /// Convert a field's absolute per-source areas back to proportions of
    /// its committed irrigated area.
    ///
    /// The proportions (not absolute volumes) are what the scheduler
    /// applies to the day's required-water figure; they sum to less than 1
    /// when the LP could not commit the full area.
    pub fn perc_irrigation_sources(
        field: &CropField,
        source_names: &[String],
        primals: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, f64> {
        let committed = field.irrigated_area().unwrap_or(0.0);

        source_names
            .iter()
            .map(|source| {
                let id = Self::var_id(field.name(), source);
                let area = primals.get(&id).copied().unwrap_or(0.0);
                let proportion = if snap_zero(committed) == 0.0 {
                    0.0
                } else {
                    area / committed
                };
                (source.clone(), proportion)
            })
            .collect()
    }

    /// Build and run a maximization over the accumulated variables.
    fn solve(
        vars: good_lp::ProblemVariables,
        objective: Expression,
        constraints: Vec<Constraint>,
        handles: Vec<(String, Variable)>,
    ) -> Result<BTreeMap<String, f64>, OptimizerError> {
        if handles.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut model = vars.maximise(objective).using(default_solver);
        for c in constraints {
            model = model.with(c);
        }

        let solution = model
            .solve()
            .map_err(|e| OptimizerError::NotOptimal(e.to_string()))?;

        Ok(handles
            .into_iter()
            .map(|(id, v)| (id, snap_zero(solution.value(v))))
            .collect())
    }
}
