use std::collections::BTreeMap;

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Power, ThermodynamicTemperature},
        mass_rate::kilogram_per_second,
        power::watt,
        specific_heat_capacity::joule_per_kilogram_kelvin,
        thermodynamic_temperature::degree_celsius,
    },
};

use crate::{
    models::airco::{
        AirStream, ChainResults, MoistAirState, Process, SizingError, SizingWarning, ZoneBalance,
        ZoneError,
        process::{Fan, Sensible},
        zone::ZoneTerminal,
    },
    support::{
        constraint::{Constrained, ConstraintError, NonNegative, StrictlyPositive},
        psychro::{PsychroModel, StateInput},
        units::TemperatureOffset,
    },
};

use super::{
    CoolingResults, SystemSizer, air_handler, cap_ventilation, collect_warnings, design::coldest,
    infeasible_flow, return_air, total_flow,
};

/// Peak winter design parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatingDesign {
    /// Outdoor air on the design day; its humidity ratio is carried through
    /// the whole system.
    pub outdoor: MoistAirState,

    /// Warmest air a zone may be supplied with.
    pub max_supply_temperature: ThermodynamicTemperature,

    pub fan: Option<Fan>,

    /// Code-minimum outdoor air.
    pub min_ventilation: Constrained<MassRate, NonNegative>,
}

impl HeatingDesign {
    pub fn new(outdoor: MoistAirState, max_supply_temperature: ThermodynamicTemperature) -> Self {
        Self {
            outdoor,
            max_supply_temperature,
            fan: None,
            min_ventilation: NonNegative::zero(),
        }
    }

    #[must_use]
    pub fn with_fan(self, fan: Fan) -> Self {
        Self {
            fan: Some(fan),
            ..self
        }
    }

    /// # Errors
    ///
    /// Returns an error if `flow` is negative.
    pub fn with_ventilation(self, flow: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            min_ventilation: NonNegative::new(flow)?,
            ..self
        })
    }
}

/// Result of a heating design.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatingResults {
    /// Balances of the zones with heating design data.
    pub zones: BTreeMap<String, ZoneBalance>,

    /// Common supply air leaving the air handler.
    pub supply: MoistAirState,

    /// Air leaving the preheat coil, ahead of the fan.
    pub preheated: MoistAirState,

    pub return_air: MoistAirState,
    pub mixed: MoistAirState,
    pub system_flow: MassRate,
    pub ventilation: MassRate,

    /// Peak preheat: outdoor air heated to the cooling coil-leaving
    /// temperature.
    pub preheat_peak: Power,

    /// Preheat of the mixed air on the design day; negative when the mixed
    /// air has to be cooled instead.
    pub preheat: Power,

    /// Sum of zone reheat.
    pub reheat: Power,

    pub fan_heat: Power,
    pub chain: ChainResults,
    pub warnings: Vec<SizingWarning>,
}

impl HeatingResults {
    /// Reheat per zone.
    pub fn zone_reheat(&self) -> impl Iterator<Item = (&str, Power)> {
        self.zones
            .iter()
            .map(|(name, balance)| (name.as_str(), balance.reheat))
    }

    /// Peak heat requirement, `preheat_peak + Σ reheat`.
    #[must_use]
    pub fn peak_heat(&self) -> Power {
        self.preheat_peak + self.reheat
    }
}

impl<M: PsychroModel> SystemSizer<M> {
    /// Sizes preheat and reheat for the winter peak.
    ///
    /// Latent loads are ignored. Zones that need heat get the flow that
    /// carries their load at the maximum supply temperature; zones that
    /// still need cooling get the flow at the cooling supply temperature.
    /// Either is floored at the zone's minimum fraction of its cooling
    /// design flow. The air handler supplies the coldest temperature any
    /// zone needs and every other zone reheats.
    ///
    /// Zones without heating design data are not served.
    ///
    /// # Errors
    ///
    /// Returns a [`SizingError`] if no zone has heating data, a zone's flow
    /// cannot be determined, or a state is not physical.
    pub fn design_heating(
        &self,
        cooling: &CoolingResults,
        design: &HeatingDesign,
    ) -> Result<HeatingResults, SizingError> {
        let ctx = &self.ctx;
        let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
        let t_max = design.max_supply_temperature.get::<degree_celsius>();
        let t_cool = cooling.supply.t();

        let mut sized = Vec::new();
        for zone in &self.zones {
            let Some(heating) = zone.heating else {
                continue;
            };
            let loads = heating.sensible_only();
            let qs = loads.sensible.get::<watt>();
            let t_zone = loads.setpoint.dry_bulb.get::<degree_celsius>();

            let required = if qs < 0.0 {
                if t_max <= t_zone {
                    return Err(SizingError::zone(&zone.name)(ZoneError::Infeasible {
                        zone: zone.name.clone(),
                        reason: "maximum supply temperature is not above the zone".into(),
                    }));
                }
                qs / (cp * (t_zone - t_max))
            } else if qs > 0.0 {
                qs / (cp * (t_zone - t_cool))
            } else {
                0.0
            };

            let design_flow = cooling.design_flow(&zone.name).unwrap_or(MassRate::ZERO);
            let m = required.max(zone.floor(design_flow).get::<kilogram_per_second>());
            let flow = StrictlyPositive::new(MassRate::new::<kilogram_per_second>(m)).map_err(|_| {
                SizingError::zone(&zone.name)(ZoneError::Infeasible {
                    zone: zone.name.clone(),
                    reason: "no load and no minimum flow".into(),
                })
            })?;
            let t_required = t_zone - qs / (m * cp);

            sized.push((zone, loads, flow, t_required));
        }

        if sized.is_empty() {
            return Err(SizingError::Infeasible {
                reason: "no zone has heating design loads".into(),
            });
        }

        let t_supply = coldest(
            sized
                .iter()
                .map(|(.., t)| ThermodynamicTemperature::new::<degree_celsius>(*t)),
        );
        let supply = ctx.state(StateInput::DryBulbHumidityRatio {
            dry_bulb: t_supply,
            humidity_ratio: design.outdoor.humidity_ratio(),
        })?;

        let mut zones = BTreeMap::new();
        for (zone, loads, flow, _) in sized {
            let balance = ZoneTerminal::ConstantVolume { flow }
                .serve(ctx, &zone.name, &loads, &supply)
                .map_err(SizingError::zone(&zone.name))?;
            zones.insert(zone.name.clone(), balance);
        }

        let mut warnings = Vec::new();
        collect_warnings(&zones, &mut warnings);

        let system_flow = total_flow(zones.values());
        let ventilation = cap_ventilation(
            self.required_ventilation(design.min_ventilation.into_inner()),
            system_flow,
            &mut warnings,
        );

        let preheat_peak = preheat_peak(self, cooling, design, ventilation)?;

        let t_preheated = match design.fan {
            Some(fan) => t_supply.less(fan.temperature_rise(ctx, &supply)),
            None => t_supply,
        };

        let return_state = return_air(ctx, &zones)?;
        let returned = AirStream::new(return_state, system_flow).map_err(infeasible_flow)?;
        let mut conditioning = vec![Process::from(Sensible::ToDryBulb(t_preheated))];
        conditioning.extend(design.fan.map(Process::from));
        let chain = air_handler(ctx, returned, &design.outdoor, ventilation, conditioning)?;

        let mixed = chain.find("mixing").map_or(return_state, |r| r.outlet.state);
        let (preheated, preheat) = chain
            .find("sensible")
            .map_or((mixed, Power::ZERO), |r| (r.outlet.state, r.loads.total));
        let fan_heat = chain.find("fan").map_or(Power::ZERO, |r| r.loads.total);
        let reheat = zones
            .values()
            .fold(Power::ZERO, |acc, zone| acc + zone.reheat);

        tracing::debug!(
            t_supply = supply.t(),
            system_flow = system_flow.get::<kilogram_per_second>(),
            preheat_peak_w = preheat_peak.get::<watt>(),
            preheat_w = preheat.get::<watt>(),
            reheat_w = reheat.get::<watt>(),
            "heating design"
        );

        Ok(HeatingResults {
            zones,
            supply: chain.outlet.state,
            preheated,
            return_air: return_state,
            mixed,
            system_flow,
            ventilation,
            preheat_peak,
            preheat,
            reheat,
            fan_heat,
            chain,
            warnings,
        })
    }
}

/// Heat to bring the outdoor air up to the cooling coil-leaving temperature.
fn preheat_peak<M: PsychroModel>(
    sizer: &SystemSizer<M>,
    cooling: &CoolingResults,
    design: &HeatingDesign,
    ventilation: MassRate,
) -> Result<Power, SizingError> {
    let target = cooling.coil_leaving.dry_bulb();
    if design.outdoor.dry_bulb() >= target {
        return Ok(Power::ZERO);
    }
    let outdoor = AirStream::new(design.outdoor, ventilation).map_err(infeasible_flow)?;
    let heated = Process::from(Sensible::ToDryBulb(target)).evaluate(&sizer.ctx, &outdoor)?;
    Ok(heated.loads.total)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{Pressure, Ratio, TemperatureInterval},
        power::kilowatt,
        pressure::pascal,
        ratio::{percent, ratio},
        temperature_interval::kelvin as delta_kelvin,
    };

    use crate::{
        models::airco::{
            AirContext, ZoneLoads, ZoneSetpoint,
            system::{CoolingDesign, ZoneDesign},
        },
        support::psychro::model::Ashrae,
    };

    fn c(t: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(t)
    }

    fn loads(sensible_kw: f64, latent_kw: f64, rh: Option<f64>) -> ZoneLoads {
        ZoneLoads {
            sensible: Power::new::<kilowatt>(sensible_kw),
            latent: Power::new::<kilowatt>(latent_kw),
            setpoint: ZoneSetpoint {
                dry_bulb: c(23.9),
                relative_humidity: rh.map(Ratio::new::<percent>),
            },
        }
    }

    fn fan() -> Fan {
        Fan::new(Pressure::new::<pascal>(747.0), Ratio::new::<percent>(60.0)).unwrap()
    }

    fn sizer(ctx: AirContext<Ashrae>) -> SystemSizer<Ashrae> {
        let zones = vec![
            ZoneDesign::new("exterior", loads(65.9, 16.4, Some(50.0)))
                .with_heating(loads(-41.9, 0.0, None))
                .with_min_flow_fraction(0.6)
                .unwrap(),
            ZoneDesign::new("interior", loads(30.3, 5.9, Some(50.0)))
                .with_heating(loads(14.4, 0.0, None))
                .with_min_flow_fraction(0.6)
                .unwrap(),
        ];
        SystemSizer::new(ctx, zones).unwrap()
    }

    fn cooling(ctx: &AirContext<Ashrae>, sizer: &SystemSizer<Ashrae>) -> CoolingResults {
        let outdoor = ctx
            .state(StateInput::DryBulbWetBulb {
                dry_bulb: c(36.1),
                wet_bulb: c(24.4),
            })
            .unwrap();
        let design = CoolingDesign::new(
            outdoor,
            TemperatureInterval::new::<delta_kelvin>(11.1),
            Ratio::new::<percent>(85.0),
        )
        .unwrap()
        .with_fan(fan())
        .with_ventilation(MassRate::new::<kilogram_per_second>(1.28))
        .unwrap();
        sizer.design_cooling(&design).unwrap()
    }

    fn winter(ctx: &AirContext<Ashrae>) -> HeatingDesign {
        let outdoor = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: c(-13.9),
                relative_humidity: Ratio::new::<ratio>(0.0),
            })
            .unwrap();
        HeatingDesign::new(outdoor, c(40.6))
            .with_fan(fan())
            .with_ventilation(MassRate::new::<kilogram_per_second>(1.45))
            .unwrap()
    }

    #[test]
    fn two_zone_winter_peak() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let sizer = sizer(ctx);
        let cooling = cooling(&ctx, &sizer);

        let results = sizer.design_heating(&cooling, &winter(&ctx))?;

        // The exterior zone needs less than 60 % of its cooling flow at
        // 40.6 °C, so the floor governs.
        let exterior = &results.zones["exterior"];
        assert_relative_eq!(
            exterior.supply.m(),
            0.6 * cooling.design_flow("exterior").unwrap().get::<kilogram_per_second>(),
            max_relative = 1e-12
        );
        assert!(exterior.supply.state.t() > 23.9);

        // The interior zone still cools and sets the common supply temperature.
        let interior = &results.zones["interior"];
        assert!(interior.supply.state.t() < 23.9);
        assert_relative_eq!(
            interior.supply.state.t(),
            c(23.9).get::<degree_celsius>()
                - 14_400.0 / (interior.supply.m() * ctx.config.cp.get::<joule_per_kilogram_kelvin>()),
            epsilon = 1e-9
        );
        assert_relative_eq!(interior.reheat.get::<watt>(), 0.0, epsilon = 1e-3);

        for (_, reheat) in results.zone_reheat() {
            assert!(reheat.get::<watt>() >= 0.0);
        }
        assert!(results.reheat.get::<kilowatt>() > 20.0);
        assert!(results.preheat_peak.get::<kilowatt>() > 0.0);
        assert!(results.peak_heat() > results.reheat);
        assert_eq!(results.supply.w(), 0.0);
        Ok(())
    }

    #[test]
    fn cooling_only_zones_are_skipped() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let zones = vec![
            ZoneDesign::new("a", loads(10.0, 1.0, Some(50.0)))
                .with_heating(loads(-5.0, 0.0, None)),
            ZoneDesign::new("b", loads(10.0, 1.0, Some(50.0))),
        ];
        let sizer = SystemSizer::new(ctx, zones)?;
        let cooling = cooling(&ctx, &sizer);

        let results = sizer.design_heating(&cooling, &winter(&ctx))?;
        assert_eq!(results.zones.len(), 1);
        assert!(results.zones.contains_key("a"));
        Ok(())
    }

    #[test]
    fn no_heating_data_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let zones = vec![ZoneDesign::new("a", loads(10.0, 1.0, Some(50.0)))];
        let sizer = SystemSizer::new(ctx, zones).unwrap();
        let cooling = cooling(&ctx, &sizer);

        let result = sizer.design_heating(&cooling, &winter(&ctx));
        assert!(matches!(result, Err(SizingError::Infeasible { .. })));
    }
}
