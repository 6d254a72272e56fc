//! Declarative scenarios.
//!
//! A [`Scenario`] is a JSON document describing process chains, zones and
//! design conditions with plain unit-suffixed numbers. It builds the typed
//! values the rest of the crate works with:
//!
//! ```
//! use airco_models::{models::airco::scenario::Scenario, support::psychro::model::Ashrae};
//!
//! let scenario = Scenario::from_json(r#"{
//!     "name": "reheat",
//!     "chains": [{
//!         "name": "main",
//!         "inlet": { "type": "DryBulbRelativeHumidity", "dry_bulb_c": 13.0, "relative_humidity": 0.9 },
//!         "m_da_kg_s": 1.0,
//!         "steps": [{ "type": "HeatToDryBulb", "dry_bulb_c": 18.0 }]
//!     }]
//! }"#).unwrap();
//!
//! let ctx = scenario.context(Ashrae);
//! let results = scenario.run_chain(&ctx, "main").unwrap();
//! assert!(results.heat_added().value > 0.0);
//! ```

mod schema;

pub use schema::{
    ChainDef, ConfigDef, CoolingDef, FanDef, HeatingDef, HeatingLoadDef, OperationDef,
    PartLoadDef, Scenario, SingleZoneDef, StateDef, StepDef, WaterDef, ZoneDef, ZoneLoadDef,
};

use thiserror::Error;
use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{
        Length, MassRate, Power, Pressure, Ratio, TemperatureInterval, ThermodynamicTemperature,
    },
    length::meter,
    mass_rate::kilogram_per_second,
    power::watt,
    pressure::{kilopascal, pascal},
    ratio::ratio,
    temperature_interval::kelvin as delta_kelvin,
    thermodynamic_temperature::degree_celsius,
};

use crate::support::{
    constraint::{ConstraintError, NonNegative, StrictlyPositive, UnitInterval},
    psychro::{PsychroModel, StateInput, water},
    units::SpecificEnthalpy,
};

use super::{
    AirContext, AircoConfig, AirStream, ChainError, ChainResults, InvalidStateError,
    MoistAirState, Process, ProcessChain, SizingError, ZoneLoads, ZoneSetpoint,
    process::{AdiabaticMixing, CoolingCoil, Fan, Humidifier, Sensible},
    system::{
        CoolingDesign, HeatingDesign, Operation, PartLoad, PartLoadResults, SingleZoneResults,
        SystemSizer, ZoneDesign,
    },
};

/// Errors building typed values from a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field is out of its allowed range.
    #[error("invalid {field}")]
    Constraint {
        field: &'static str,
        #[source]
        source: ConstraintError,
    },

    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    #[error("no chain named {name:?}")]
    UnknownChain { name: String },

    #[error("chain {name:?} failed")]
    Chain {
        name: String,
        #[source]
        source: ChainError,
    },

    #[error("no part-load point named {name:?}")]
    UnknownPartLoad { name: String },

    /// A part-load run needs the cooling design it runs against.
    #[error("scenario has no cooling design")]
    MissingCooling,

    #[error(transparent)]
    Sizing(#[from] SizingError),
}

fn field(field: &'static str) -> impl FnOnce(ConstraintError) -> ScenarioError {
    move |source| ScenarioError::Constraint { field, source }
}

impl Scenario {
    /// Parses a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Json`] for malformed JSON or a document that
    /// does not match the schema.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the scenario as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Json`] if serialization fails, which only
    /// happens for non-finite numbers.
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The evaluation context this scenario runs in.
    pub fn context<M: PsychroModel>(&self, model: M) -> AirContext<M> {
        let mut config = AircoConfig {
            solver: self.config.solver,
            ..AircoConfig::default()
        };
        if let Some(pressure) = self.config.pressure_kpa {
            config = config.with_pressure(Pressure::new::<kilopascal>(pressure));
        } else if let Some(altitude) = self.config.altitude_m {
            config = config.at_altitude(Length::new::<meter>(altitude));
        }
        AirContext::new(model, config)
    }

    /// Builds the named chain and the stream entering it.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownChain`] if no chain has that name, or
    /// another [`ScenarioError`] if a state or a step parameter is invalid.
    pub fn build_chain<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        name: &str,
    ) -> Result<(ProcessChain, AirStream), ScenarioError> {
        let def = self
            .chains
            .iter()
            .find(|chain| chain.name == name)
            .ok_or_else(|| ScenarioError::UnknownChain {
                name: name.to_owned(),
            })?;

        let inlet = AirStream::new(def.inlet.state(ctx)?, kg_s(def.m_da_kg_s))
            .map_err(field("chain inlet flow"))?;

        let mut chain = ProcessChain::new();
        for step in &def.steps {
            chain = step.append(chain, ctx)?;
        }

        tracing::debug!(chain = name, steps = chain.steps().len(), "built chain");
        Ok((chain, inlet))
    }

    /// Builds and evaluates the named chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the chain cannot be built, or
    /// [`ScenarioError::Chain`] if a step fails.
    pub fn run_chain<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        name: &str,
    ) -> Result<ChainResults, ScenarioError> {
        let (chain, inlet) = self.build_chain(ctx, name)?;
        chain
            .evaluate(ctx, &inlet)
            .map_err(|source| ScenarioError::Chain {
                name: name.to_owned(),
                source,
            })
    }

    /// Zone design data.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Constraint`] for a negative flow or a
    /// minimum-flow fraction outside `[0, 1]`.
    pub fn zones(&self) -> Result<Vec<ZoneDesign>, ScenarioError> {
        self.zones.iter().map(ZoneDef::design).collect()
    }

    /// A sizer for the scenario's zones.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the zone data is invalid or the zone
    /// list is empty or has duplicate names.
    pub fn sizer<M: PsychroModel>(
        &self,
        ctx: AirContext<M>,
    ) -> Result<SystemSizer<M>, ScenarioError> {
        Ok(SystemSizer::new(ctx, self.zones()?)?)
    }

    /// Summer design parameters, if the scenario has them.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if a parameter is out of range or the
    /// outdoor state is invalid.
    pub fn cooling_design<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
    ) -> Result<Option<CoolingDesign>, ScenarioError> {
        self.cooling.as_ref().map(|def| def.design(ctx)).transpose()
    }

    /// The named part-load point.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownPartLoad`] if no point has that name,
    /// or another [`ScenarioError`] if a state or flow is invalid.
    pub fn part_load<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        name: &str,
    ) -> Result<PartLoad, ScenarioError> {
        let def = self
            .part_loads
            .iter()
            .find(|point| point.name == name)
            .ok_or_else(|| ScenarioError::UnknownPartLoad {
                name: name.to_owned(),
            })?;
        def.part_load(ctx)
    }

    /// Sizes the cooling design and runs it at the named part-load point.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::MissingCooling`] without a cooling design,
    /// or another [`ScenarioError`] if building, sizing or the part-load
    /// run fails.
    pub fn run_part_load<M: PsychroModel>(
        &self,
        ctx: AirContext<M>,
        name: &str,
    ) -> Result<PartLoadResults, ScenarioError> {
        let part = self.part_load(&ctx, name)?;
        let design = self
            .cooling_design(&ctx)?
            .ok_or(ScenarioError::MissingCooling)?;

        let sizer = self.sizer(ctx)?;
        let designed = sizer.design_cooling(&design)?;
        Ok(sizer.part_load(&designed, &part)?)
    }

    /// Runs the single-zone design, if the scenario has one.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::UnknownZone`] (as [`ScenarioError::Sizing`])
    /// if the named zone is not in the scenario, or another
    /// [`ScenarioError`] if building or sizing fails.
    pub fn single_zone_design<M: PsychroModel>(
        &self,
        ctx: AirContext<M>,
    ) -> Result<Option<SingleZoneResults>, ScenarioError> {
        let Some(def) = &self.single_zone else {
            return Ok(None);
        };

        let zone = self
            .zones
            .iter()
            .find(|zone| zone.name == def.zone)
            .ok_or_else(|| SizingError::UnknownZone {
                zone: def.zone.clone(),
            })?
            .design()?;
        let design = def.cooling.design(&ctx)?;

        let sizer = SystemSizer::new(ctx, vec![zone])?;
        Ok(Some(sizer.design_single_zone(&design)?))
    }

    /// Winter design parameters, if the scenario has them.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if a parameter is out of range or the
    /// outdoor state is invalid.
    pub fn heating_design<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
    ) -> Result<Option<HeatingDesign>, ScenarioError> {
        let Some(def) = &self.heating else {
            return Ok(None);
        };

        let mut design = HeatingDesign::new(def.outdoor.state(ctx)?, celsius(def.max_supply_c))
            .with_ventilation(kg_s(def.ventilation_kg_s))
            .map_err(field("ventilation flow"))?;
        if let Some(fan) = &def.fan {
            design = design.with_fan(fan.fan()?);
        }
        Ok(Some(design))
    }
}

impl StateDef {
    /// The property pair this definition names.
    #[must_use]
    pub fn input(&self) -> StateInput {
        match *self {
            Self::DryBulbWetBulb {
                dry_bulb_c,
                wet_bulb_c,
            } => StateInput::DryBulbWetBulb {
                dry_bulb: celsius(dry_bulb_c),
                wet_bulb: celsius(wet_bulb_c),
            },
            Self::DryBulbRelativeHumidity {
                dry_bulb_c,
                relative_humidity,
            } => StateInput::DryBulbRelativeHumidity {
                dry_bulb: celsius(dry_bulb_c),
                relative_humidity: fraction(relative_humidity),
            },
            Self::DryBulbHumidityRatio {
                dry_bulb_c,
                humidity_ratio,
            } => StateInput::DryBulbHumidityRatio {
                dry_bulb: celsius(dry_bulb_c),
                humidity_ratio: fraction(humidity_ratio),
            },
            Self::DryBulbDewPoint {
                dry_bulb_c,
                dew_point_c,
            } => StateInput::DryBulbDewPoint {
                dry_bulb: celsius(dry_bulb_c),
                dew_point: celsius(dew_point_c),
            },
            Self::DryBulbEnthalpy {
                dry_bulb_c,
                enthalpy_j_per_kg,
            } => StateInput::DryBulbEnthalpy {
                dry_bulb: celsius(dry_bulb_c),
                enthalpy: enthalpy(enthalpy_j_per_kg),
            },
            Self::EnthalpyHumidityRatio {
                enthalpy_j_per_kg,
                humidity_ratio,
            } => StateInput::EnthalpyHumidityRatio {
                enthalpy: enthalpy(enthalpy_j_per_kg),
                humidity_ratio: fraction(humidity_ratio),
            },
            Self::HumidityRatioRelativeHumidity {
                humidity_ratio,
                relative_humidity,
            } => StateInput::HumidityRatioRelativeHumidity {
                humidity_ratio: fraction(humidity_ratio),
                relative_humidity: fraction(relative_humidity),
            },
            Self::WetBulbRelativeHumidity {
                wet_bulb_c,
                relative_humidity,
            } => StateInput::WetBulbRelativeHumidity {
                wet_bulb: celsius(wet_bulb_c),
                relative_humidity: fraction(relative_humidity),
            },
            Self::WetBulbHumidityRatio {
                wet_bulb_c,
                humidity_ratio,
            } => StateInput::WetBulbHumidityRatio {
                wet_bulb: celsius(wet_bulb_c),
                humidity_ratio: fraction(humidity_ratio),
            },
            Self::RelativeHumidityEnthalpy {
                relative_humidity,
                enthalpy_j_per_kg,
            } => StateInput::RelativeHumidityEnthalpy {
                relative_humidity: fraction(relative_humidity),
                enthalpy: enthalpy(enthalpy_j_per_kg),
            },
        }
    }

    /// Resolves the state at the context pressure.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidStateError`] for inconsistent or out-of-range
    /// properties.
    pub fn state<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
    ) -> Result<MoistAirState, InvalidStateError> {
        ctx.state(self.input())
    }
}

impl WaterDef {
    #[must_use]
    pub fn enthalpy(&self) -> SpecificEnthalpy {
        match *self {
            Self::Steam { temperature_c } => water::vapor_enthalpy(celsius(temperature_c)),
            Self::Liquid { temperature_c } => water::liquid_enthalpy(celsius(temperature_c)),
            Self::Enthalpy { enthalpy_j_per_kg } => enthalpy(enthalpy_j_per_kg),
        }
    }
}

impl FanDef {
    fn fan(&self) -> Result<Fan, ScenarioError> {
        let fan = Fan::new(
            Pressure::new::<pascal>(self.pressure_rise_pa),
            fraction(self.efficiency),
        )
        .map_err(field("fan"))?;
        match self.motor_efficiency {
            Some(eta) => fan.with_motor(fraction(eta)).map_err(field("fan motor efficiency")),
            None => Ok(fan),
        }
    }
}

impl StepDef {
    fn append<M: PsychroModel>(
        &self,
        chain: ProcessChain,
        ctx: &AirContext<M>,
    ) -> Result<ProcessChain, ScenarioError> {
        let process = match self {
            Self::Split { branch, m_da_kg_s } => {
                let m_da = NonNegative::new(kg_s(*m_da_kg_s)).map_err(field("split flow"))?;
                return Ok(chain.split(branch.clone(), m_da));
            }
            Self::Merge { branch } => return Ok(chain.merge(branch.clone())),
            Self::Mix { state, m_da_kg_s } => {
                let other = AirStream::new(state.state(ctx)?, kg_s(*m_da_kg_s))
                    .map_err(field("mixed stream flow"))?;
                Process::from(AdiabaticMixing::with(other))
            }
            Self::HeatToDryBulb { dry_bulb_c } => {
                Process::from(Sensible::ToDryBulb(celsius(*dry_bulb_c)))
            }
            Self::HeatRate { heat_w } => {
                Process::from(Sensible::HeatRate(Power::new::<watt>(*heat_w)))
            }
            Self::CoilOutlet {
                dry_bulb_c,
                humidity_ratio,
            } => Process::from(CoolingCoil::Outlet {
                dry_bulb: celsius(*dry_bulb_c),
                humidity_ratio: fraction(*humidity_ratio),
            }),
            Self::CoilBypass {
                apparatus_dew_point_c,
                bypass_factor,
            } => Process::from(CoolingCoil::Bypass {
                apparatus_dew_point: celsius(*apparatus_dew_point_c),
                bypass_factor: UnitInterval::new(*bypass_factor).map_err(field("bypass factor"))?,
            }),
            Self::CoilCapacity {
                apparatus_dew_point_c,
                capacity_w,
            } => Process::from(CoolingCoil::Capacity {
                apparatus_dew_point: celsius(*apparatus_dew_point_c),
                capacity: StrictlyPositive::new(Power::new::<watt>(*capacity_w))
                    .map_err(field("coil capacity"))?,
            }),
            Self::Inject { water_kg_s, water } => Process::from(Humidifier::Injection {
                water: NonNegative::new(kg_s(*water_kg_s)).map_err(field("water flow"))?,
                enthalpy: water.enthalpy(),
            }),
            Self::HumidifyToHumidityRatio {
                humidity_ratio,
                water,
            } => Process::from(Humidifier::ToHumidityRatio {
                humidity_ratio: fraction(*humidity_ratio),
                water_enthalpy: water.enthalpy(),
            }),
            Self::HumidifyToRelativeHumidity {
                relative_humidity,
                water,
            } => Process::from(Humidifier::ToRelativeHumidity {
                relative_humidity: UnitInterval::new(fraction(*relative_humidity))
                    .map_err(field("relative humidity"))?,
                water_enthalpy: water.enthalpy(),
            }),
            Self::Evaporative { effectiveness } => Process::from(Humidifier::Evaporative {
                effectiveness: UnitInterval::new(*effectiveness)
                    .map_err(field("saturation effectiveness"))?,
            }),
            Self::Fan(fan) => Process::from(fan.fan()?),
        };
        Ok(chain.then(process))
    }
}

impl CoolingDef {
    fn design<M: PsychroModel>(&self, ctx: &AirContext<M>) -> Result<CoolingDesign, ScenarioError> {
        let mut design = CoolingDesign::new(
            self.outdoor.state(ctx)?,
            TemperatureInterval::new::<delta_kelvin>(self.supply_delta_t_k),
            fraction(self.coil_relative_humidity),
        )
        .map_err(field("coil relative humidity"))?
        .with_diversity(self.diversity)
        .map_err(field("diversity"))?
        .with_min_system_flow(kg_s(self.min_system_flow_kg_s))
        .map_err(field("minimum system flow"))?
        .with_ventilation(kg_s(self.ventilation_kg_s))
        .map_err(field("ventilation flow"))?;

        if let Some(fan) = &self.fan {
            design = design.with_fan(fan.fan()?);
        }
        Ok(design)
    }
}

impl PartLoadDef {
    fn part_load<M: PsychroModel>(&self, ctx: &AirContext<M>) -> Result<PartLoad, ScenarioError> {
        let operation = match self.operation {
            OperationDef::Vav => Operation::Vav,
            OperationDef::ConstantVolume => Operation::ConstantVolume,
        };

        let mut part = PartLoad::new(operation, self.outdoor.state(ctx)?)
            .with_ventilation(kg_s(self.ventilation_kg_s))
            .map_err(field("part-load ventilation flow"))?
            .with_min_system_flow(kg_s(self.min_system_flow_kg_s))
            .map_err(field("part-load minimum system flow"))?;
        for zone in &self.zones {
            part = part.with_zone(
                zone.zone.clone(),
                cooling_loads(
                    zone.sensible_w,
                    zone.latent_w,
                    zone.dry_bulb_c,
                    zone.relative_humidity,
                ),
            );
        }
        Ok(part)
    }
}

impl ZoneDef {
    fn design(&self) -> Result<ZoneDesign, ScenarioError> {
        let cooling = cooling_loads(
            self.sensible_w,
            self.latent_w,
            self.dry_bulb_c,
            self.relative_humidity,
        );

        let mut design = ZoneDesign::new(self.name.clone(), cooling)
            .with_min_flow(kg_s(self.min_flow_kg_s))
            .map_err(field("zone minimum flow"))?
            .with_min_flow_fraction(self.min_flow_fraction)
            .map_err(field("zone minimum flow fraction"))?
            .with_exhaust(kg_s(self.exhaust_kg_s))
            .map_err(field("zone exhaust"))?;

        if let Some(heating) = self.heating {
            design = design.with_heating(ZoneLoads {
                sensible: Power::new::<watt>(heating.sensible_w),
                latent: Power::new::<watt>(0.0),
                setpoint: ZoneSetpoint {
                    dry_bulb: celsius(heating.dry_bulb_c),
                    relative_humidity: None,
                },
            });
        }
        Ok(design)
    }
}

fn cooling_loads(
    sensible_w: f64,
    latent_w: f64,
    dry_bulb_c: f64,
    relative_humidity: Option<f64>,
) -> ZoneLoads {
    ZoneLoads {
        sensible: Power::new::<watt>(sensible_w),
        latent: Power::new::<watt>(latent_w),
        setpoint: ZoneSetpoint {
            dry_bulb: celsius(dry_bulb_c),
            relative_humidity: relative_humidity.map(fraction),
        },
    }
}

fn celsius(t: f64) -> ThermodynamicTemperature {
    ThermodynamicTemperature::new::<degree_celsius>(t)
}

fn fraction(value: f64) -> Ratio {
    Ratio::new::<ratio>(value)
}

fn enthalpy(value: f64) -> SpecificEnthalpy {
    SpecificEnthalpy::new::<joule_per_kilogram>(value)
}

fn kg_s(value: f64) -> MassRate {
    MassRate::new::<kilogram_per_second>(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::psychro::model::Ashrae;

    const AIR_HANDLER: &str = r#"{
        "name": "office",
        "chains": [{
            "name": "summer",
            "inlet": { "type": "DryBulbRelativeHumidity", "dry_bulb_c": 24.0, "relative_humidity": 0.5 },
            "m_da_kg_s": 2.0,
            "steps": [
                { "type": "Split", "branch": "relief", "m_da_kg_s": 0.5 },
                {
                    "type": "Mix",
                    "state": { "type": "DryBulbWetBulb", "dry_bulb_c": 35.0, "wet_bulb_c": 24.0 },
                    "m_da_kg_s": 0.5
                },
                { "type": "CoilBypass", "apparatus_dew_point_c": 10.0, "bypass_factor": 0.1 },
                { "type": "Fan", "pressure_rise_pa": 600.0, "efficiency": 0.65 }
            ]
        }],
        "zones": [
            { "name": "east", "sensible_w": 12000.0, "latent_w": 2000.0, "dry_bulb_c": 24.0,
              "relative_humidity": 0.5, "min_flow_fraction": 0.3,
              "heating": { "sensible_w": -8000.0, "dry_bulb_c": 21.0 } },
            { "name": "core", "sensible_w": 8000.0, "latent_w": 1500.0, "dry_bulb_c": 24.0,
              "relative_humidity": 0.5, "exhaust_kg_s": 0.2 }
        ],
        "cooling": {
            "outdoor": { "type": "DryBulbWetBulb", "dry_bulb_c": 35.0, "wet_bulb_c": 24.0 },
            "supply_delta_t_k": 11.0,
            "coil_relative_humidity": 0.9,
            "ventilation_kg_s": 0.4
        }
    }"#;

    #[test]
    fn builds_and_runs_chain() -> Result<(), ScenarioError> {
        let scenario = Scenario::from_json(AIR_HANDLER)?;
        let ctx = scenario.context(Ashrae);

        let results = scenario.run_chain(&ctx, "summer")?;
        assert_eq!(results.records.len(), 4);
        assert_eq!(results.exhausted.len(), 1);
        assert_eq!(results.exhausted[0].0, "relief");
        assert_relative_eq!(results.outlet.m(), 2.0, epsilon = 1e-12);
        assert!(results.heat_removed().value > 0.0);
        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> Result<(), ScenarioError> {
        let scenario = Scenario::from_json(AIR_HANDLER)?;
        let again = Scenario::from_json(&scenario.to_json()?)?;
        assert_eq!(again, scenario);
        Ok(())
    }

    #[test]
    fn zones_and_design() -> Result<(), ScenarioError> {
        let scenario = Scenario::from_json(AIR_HANDLER)?;
        let ctx = scenario.context(Ashrae);

        let zones = scenario.zones()?;
        assert_eq!(zones.len(), 2);
        assert!(zones[0].heating.is_some());
        assert_eq!(zones[1].exhaust.into_inner(), kg_s(0.2));

        let design = scenario.cooling_design(&ctx)?.unwrap();
        assert_eq!(design.diversity.into_inner(), 1.0);
        assert!(scenario.heating_design(&ctx)?.is_none());

        let results = scenario.sizer(ctx)?.design_cooling(&design)?;
        assert_eq!(results.zones.len(), 2);
        Ok(())
    }

    #[test]
    fn altitude_lowers_pressure() -> Result<(), ScenarioError> {
        let scenario =
            Scenario::from_json(r#"{ "name": "denver", "config": { "altitude_m": 1600.0 } }"#)?;
        let ctx = scenario.context(Ashrae);
        assert!(ctx.config.pressure.get::<kilopascal>() < 85.0);

        let explicit = Scenario::from_json(
            r#"{ "name": "lab", "config": { "pressure_kpa": 95.0, "altitude_m": 1600.0 } }"#,
        )?;
        assert_relative_eq!(
            explicit.context(Ashrae).config.pressure.get::<kilopascal>(),
            95.0
        );
        Ok(())
    }

    #[test]
    fn reports_bad_fields() {
        let scenario = Scenario::from_json(
            r#"{ "name": "bad", "zones": [
                { "name": "z", "sensible_w": 1.0, "latent_w": 0.0, "dry_bulb_c": 24.0,
                  "min_flow_fraction": 1.5 }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.zones(),
            Err(ScenarioError::Constraint { field: "zone minimum flow fraction", .. })
        ));

        let ctx = scenario.context(Ashrae);
        assert!(matches!(
            scenario.build_chain(&ctx, "missing"),
            Err(ScenarioError::UnknownChain { .. })
        ));

        assert!(matches!(
            Scenario::from_json(r#"{ "name": 3 }"#),
            Err(ScenarioError::Json(_))
        ));
    }
}
