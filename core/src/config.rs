//! Declarative specification loading
//!
//! The simulation core never parses raw configuration mid-run: fully
//! populated domain objects are built here, before any zone exists, and
//! malformed specifications fail at load time with [`SpecError`].
//!
//! Parameters that are "uncertain" in the exploratory-modeling sense are
//! declared as `{nominal, lower, upper}` ranges and resolve to a single
//! concrete value in one explicit step during loading - the domain objects
//! carry plain numbers and never know a value was uncertain.

use crate::allocation::AllocationLedger;
use crate::models::crop::{Crop, GrowthStage};
use crate::models::field::CropField;
use crate::models::infrastructure::{Infrastructure, MaintenanceRate};
use crate::models::irrigation::IrrigationSystem;
use crate::models::pump::Pump;
use crate::models::water_source::WaterSource;
use crate::models::zone::{FarmZone, ZoneError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading specifications
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("could not parse specification: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("parameter '{name}' is unresolvable: nominal {nominal} outside [{lower}, {upper}]")]
    UnresolvableParameter {
        name: String,
        nominal: f64,
        lower: f64,
        upper: f64,
    },

    #[error("invalid specification: {0}")]
    Invalid(String),

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// A numeric parameter: either a fixed value or an uncertain range that
/// resolves to its nominal value at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    Fixed(f64),
    Range {
        nominal: f64,
        lower: f64,
        upper: f64,
    },
}

impl ParamSpec {
    /// Resolve to a concrete value, validating range consistency.
    pub fn resolve(&self, name: &str) -> Result<f64, SpecError> {
        match *self {
            ParamSpec::Fixed(v) => Ok(v),
            ParamSpec::Range {
                nominal,
                lower,
                upper,
            } => {
                if lower > nominal || nominal > upper {
                    return Err(SpecError::UnresolvableParameter {
                        name: name.to_string(),
                        nominal,
                        lower,
                        upper,
                    });
                }
                Ok(nominal)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthStageSpec {
    pub name: String,
    pub stage_length: ParamSpec,
    pub depletion_fraction: ParamSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropSpec {
    pub name: String,
    pub crop_type: String,
    pub plant_month: u32,
    pub plant_day: u32,
    pub growth_stages: Vec<GrowthStageSpec>,
    pub yield_per_ha: ParamSpec,
    pub price_per_yield: ParamSpec,
    pub variable_cost_per_ha: ParamSpec,
    pub water_use_ml_per_ha: ParamSpec,
    pub root_depth_m: ParamSpec,
    pub et_coef: ParamSpec,
    pub wue_coef: ParamSpec,
    pub rainfall_threshold: ParamSpec,
    pub ssm_coef: ParamSpec,
    pub effective_root_zone: ParamSpec,
}

impl CropSpec {
    pub fn resolve(&self) -> Result<Crop, SpecError> {
        // Plant dates recur yearly; validate against an arbitrary non-leap year
        if NaiveDate::from_ymd_opt(2001, self.plant_month, self.plant_day).is_none() {
            return Err(SpecError::Invalid(format!(
                "crop {}: invalid plant date {}-{}",
                self.name, self.plant_month, self.plant_day
            )));
        }

        let mut growth_stages = Vec::with_capacity(self.growth_stages.len());
        for stage in &self.growth_stages {
            let label = format!("{}.{}.stage_length", self.name, stage.name);
            let length = stage.stage_length.resolve(&label)?;
            if length < 0.0 {
                return Err(SpecError::Invalid(format!(
                    "crop {}: stage {} has negative duration",
                    self.name, stage.name
                )));
            }

            let depletion = stage
                .depletion_fraction
                .resolve(&format!("{}.{}.depletion_fraction", self.name, stage.name))?;

            growth_stages.push((
                stage.name.clone(),
                GrowthStage {
                    stage_length: length as i64,
                    depletion_fraction: depletion,
                },
            ));
        }

        let p = |spec: &ParamSpec, field: &str| spec.resolve(&format!("{}.{field}", self.name));

        Ok(Crop {
            name: self.name.clone(),
            crop_type: self.crop_type.clone(),
            plant_month: self.plant_month,
            plant_day: self.plant_day,
            growth_stages,
            yield_per_ha: p(&self.yield_per_ha, "yield_per_ha")?,
            price_per_yield: p(&self.price_per_yield, "price_per_yield")?,
            variable_cost_per_ha: p(&self.variable_cost_per_ha, "variable_cost_per_ha")?,
            water_use_ml_per_ha: p(&self.water_use_ml_per_ha, "water_use_ml_per_ha")?,
            root_depth_m: p(&self.root_depth_m, "root_depth_m")?,
            et_coef: p(&self.et_coef, "et_coef")?,
            wue_coef: p(&self.wue_coef, "wue_coef")?,
            rainfall_threshold: p(&self.rainfall_threshold, "rainfall_threshold")?,
            ssm_coef: p(&self.ssm_coef, "ssm_coef")?,
            effective_root_zone: p(&self.effective_root_zone, "effective_root_zone")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceSpec {
    pub interval_years: usize,
    pub rate: ParamSpec,
}

impl MaintenanceSpec {
    fn resolve(&self, name: &str) -> Result<MaintenanceRate, SpecError> {
        Ok(MaintenanceRate {
            interval_years: self.interval_years,
            rate: self.rate.resolve(name)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureSpec {
    pub name: String,
    pub capital_cost_per_ha: ParamSpec,
    pub minor_maintenance: MaintenanceSpec,
    pub major_maintenance: MaintenanceSpec,
    #[serde(default = "default_true")]
    pub implemented: bool,
}

fn default_true() -> bool {
    true
}

impl InfrastructureSpec {
    fn resolve(&self) -> Result<Infrastructure, SpecError> {
        Ok(Infrastructure {
            name: self.name.clone(),
            capital_cost_per_ha: self
                .capital_cost_per_ha
                .resolve(&format!("{}.capital_cost_per_ha", self.name))?,
            minor_maintenance: self
                .minor_maintenance
                .resolve(&format!("{}.minor_maintenance", self.name))?,
            major_maintenance: self
                .major_maintenance
                .resolve(&format!("{}.major_maintenance", self.name))?,
            implemented: self.implemented,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpSpec {
    #[serde(flatten)]
    pub infrastructure: InfrastructureSpec,
    pub pump_efficiency: ParamSpec,
    pub cost_per_kw: ParamSpec,
    pub derating: ParamSpec,
}

impl PumpSpec {
    pub fn resolve(&self) -> Result<Pump, SpecError> {
        let name = &self.infrastructure.name;
        Ok(Pump {
            infrastructure: self.infrastructure.resolve()?,
            pump_efficiency: self
                .pump_efficiency
                .resolve(&format!("{name}.pump_efficiency"))?,
            cost_per_kw: self.cost_per_kw.resolve(&format!("{name}.cost_per_kw"))?,
            derating: self.derating.resolve(&format!("{name}.derating"))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationSpec {
    #[serde(flatten)]
    pub infrastructure: InfrastructureSpec,
    pub efficiency: ParamSpec,
    pub flow_ml_day: ParamSpec,
    pub head_pressure: ParamSpec,
}

impl IrrigationSpec {
    pub fn resolve(&self) -> Result<IrrigationSystem, SpecError> {
        let name = &self.infrastructure.name;
        Ok(IrrigationSystem {
            infrastructure: self.infrastructure.resolve()?,
            efficiency: self.efficiency.resolve(&format!("{name}.efficiency"))?,
            flow_ml_day: self.flow_ml_day.resolve(&format!("{name}.flow_ml_day"))?,
            head_pressure: self
                .head_pressure
                .resolve(&format!("{name}.head_pressure"))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterSourceSpec {
    pub name: String,
    pub head: ParamSpec,
    pub cost_per_ml: ParamSpec,
    #[serde(default)]
    pub cost_per_ha: Option<ParamSpec>,
    pub yearly_costs: ParamSpec,
    /// Opening allocation for the period (ML)
    pub allocation: ParamSpec,
    pub pump: PumpSpec,
}

impl WaterSourceSpec {
    pub fn resolve(&self) -> Result<(WaterSource, f64), SpecError> {
        let name = &self.name;
        let cost_per_ha = match &self.cost_per_ha {
            Some(spec) => spec.resolve(&format!("{name}.cost_per_ha"))?,
            None => 0.0,
        };

        let source = WaterSource {
            name: self.name.clone(),
            head: self.head.resolve(&format!("{name}.head"))?,
            cost_per_ml: self.cost_per_ml.resolve(&format!("{name}.cost_per_ml"))?,
            cost_per_ha,
            yearly_costs: self.yearly_costs.resolve(&format!("{name}.yearly_costs"))?,
            pump: self.pump.resolve()?,
        };
        let allocation = self.allocation.resolve(&format!("{name}.allocation"))?;

        Ok((source, allocation))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub total_area_ha: ParamSpec,
    pub irrigation: IrrigationSpec,
    pub crop_rotation: Vec<CropSpec>,
    pub soil_taw: ParamSpec,
    #[serde(default)]
    pub initial_swd: Option<ParamSpec>,
}

impl FieldSpec {
    pub fn resolve(&self) -> Result<CropField, SpecError> {
        if self.crop_rotation.is_empty() {
            return Err(SpecError::Invalid(format!(
                "field {}: crop rotation cannot be empty",
                self.name
            )));
        }

        let rotation = self
            .crop_rotation
            .iter()
            .map(|c| c.resolve())
            .collect::<Result<Vec<_>, _>>()?;

        let initial_swd = match &self.initial_swd {
            Some(spec) => spec.resolve(&format!("{}.initial_swd", self.name))?,
            None => 0.0,
        };

        Ok(CropField::new(
            self.name.clone(),
            self.total_area_ha
                .resolve(&format!("{}.total_area_ha", self.name))?,
            self.irrigation.resolve()?,
            rotation,
            self.soil_taw.resolve(&format!("{}.soil_taw", self.name))?,
            initial_swd,
        ))
    }
}

/// Complete zone specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub water_sources: Vec<WaterSourceSpec>,
}

impl ZoneSpec {
    /// Parse a zone specification from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve every parameter and assemble the zone.
    pub fn resolve(&self) -> Result<FarmZone, SpecError> {
        let fields = self
            .fields
            .iter()
            .map(|f| f.resolve())
            .collect::<Result<Vec<_>, _>>()?;

        let mut sources = Vec::with_capacity(self.water_sources.len());
        let mut allocations = Vec::with_capacity(self.water_sources.len());
        for ws_spec in &self.water_sources {
            let (source, allocation) = ws_spec.resolve()?;
            allocations.push((source.name.clone(), allocation));
            sources.push(source);
        }

        let ledger = AllocationLedger::new(allocations);
        Ok(FarmZone::new(self.name.clone(), fields, sources, ledger)?)
    }
}
