use std::collections::BTreeMap;

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Power, Ratio, TemperatureInterval, ThermodynamicTemperature, VolumeRate},
        mass_rate::kilogram_per_second,
        power::watt,
        thermodynamic_temperature::degree_celsius,
    },
};

use crate::{
    models::airco::{
        AirContext, AirStream, ChainResults, Loads, MoistAirState, Process, SizingError,
        SizingWarning, ZoneBalance,
        process::{CoolingCoil, Fan},
        zone::ZoneTerminal,
    },
    support::{
        constraint::{
            Constrained, ConstraintError, NonNegative, UnitInterval, UnitIntervalLowerOpen,
        },
        psychro::{PsychroModel, StateInput},
        units::TemperatureOffset,
    },
};

use super::{
    SystemSizer, air_handler, cap_ventilation, collect_warnings, infeasible_flow, return_air,
    total_flow, ventilation_load,
};

/// Peak summer design parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingDesign {
    /// Outdoor air on the design day.
    pub outdoor: MoistAirState,

    /// Supply air is this much colder than the coldest zone setpoint.
    pub supply_delta_t: TemperatureInterval,

    /// Relative humidity of the air leaving the cooling coil.
    pub coil_relative_humidity: Constrained<Ratio, UnitInterval>,

    /// Supply fan between the coil and the zones.
    pub fan: Option<Fan>,

    /// Ratio of the coincident system peak to the sum of zone peaks.
    pub diversity: Constrained<f64, UnitIntervalLowerOpen>,

    pub min_system_flow: Constrained<MassRate, NonNegative>,

    /// Code-minimum outdoor air.
    pub min_ventilation: Constrained<MassRate, NonNegative>,
}

impl CoolingDesign {
    /// Design parameters without a fan, diversity or flow minimums.
    ///
    /// # Errors
    ///
    /// Returns an error if the coil relative humidity is outside `[0, 1]`.
    pub fn new(
        outdoor: MoistAirState,
        supply_delta_t: TemperatureInterval,
        coil_relative_humidity: Ratio,
    ) -> Result<Self, ConstraintError> {
        Ok(Self {
            outdoor,
            supply_delta_t,
            coil_relative_humidity: UnitInterval::new(coil_relative_humidity)?,
            fan: None,
            diversity: UnitIntervalLowerOpen::one(),
            min_system_flow: NonNegative::zero(),
            min_ventilation: NonNegative::zero(),
        })
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
    /// Returns an error if `diversity` is outside `(0, 1]`.
    pub fn with_diversity(self, diversity: f64) -> Result<Self, ConstraintError> {
        Ok(Self {
            diversity: UnitIntervalLowerOpen::new(diversity)?,
            ..self
        })
    }

    /// # Errors
    ///
    /// Returns an error if `flow` is negative.
    pub fn with_min_system_flow(self, flow: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            min_system_flow: NonNegative::new(flow)?,
            ..self
        })
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

/// Result of a cooling design.
#[derive(Debug, Clone, PartialEq)]
pub struct CoolingResults {
    /// Zone balances keyed by zone name.
    pub zones: BTreeMap<String, ZoneBalance>,

    /// Supply air delivered to the zone terminals.
    pub supply: MoistAirState,

    /// Air leaving the cooling coil.
    pub coil_leaving: MoistAirState,

    /// Mixed return air from the zones.
    pub return_air: MoistAirState,

    /// Return and outdoor air entering the coil.
    pub mixed: MoistAirState,

    /// Sum of zone design flows.
    pub zone_flow: MassRate,

    /// Air handler flow after diversity and the system minimum.
    pub system_flow: MassRate,

    /// Outdoor air flow.
    pub ventilation: MassRate,

    /// Air handler evaluation, including the relief branch.
    pub chain: ChainResults,

    /// Supply fan, carried into part-load runs.
    pub fan: Option<Fan>,

    /// Coil loads from the airstream's side (negative).
    pub cooling_coil: Loads,

    pub fan_heat: Power,

    /// Load brought in by outdoor air, `m_v·(h_outdoor - h_return)`.
    pub ventilation_load: Power,

    /// Air handler energy balance,
    /// `Q_coil + Q_fan + m·(h_return - h_supply) + Q_ventilation`.
    pub residual: Power,

    pub warnings: Vec<SizingWarning>,
}

impl CoolingResults {
    /// Design supply flow of a zone.
    #[must_use]
    pub fn design_flow(&self, zone: &str) -> Option<MassRate> {
        self.zones.get(zone).map(|balance| balance.supply.m_da())
    }

    /// Supply volume flow at the supply state, for fan selection.
    #[must_use]
    pub fn supply_volume_flow(&self) -> VolumeRate {
        self.system_flow * self.supply.specific_volume()
    }
}

impl<M: PsychroModel> SystemSizer<M> {
    /// Sizes the system for the summer peak.
    ///
    /// The supply temperature is the coldest zone setpoint less the design
    /// supply temperature difference. With a fan, the coil leaves the air at
    /// the design coil humidity and the fan temperature rise colder, so fan
    /// heat brings it back to the supply temperature. Each zone gets the
    /// flow that absorbs its sensible load, subject to its minimum.
    ///
    /// # Errors
    ///
    /// Returns a [`SizingError`] if a zone cannot be served, a design state
    /// is not physical, or the air handler cannot reach the coil-leaving
    /// state from the mixed air.
    pub fn design_cooling(&self, design: &CoolingDesign) -> Result<CoolingResults, SizingError> {
        let ctx = &self.ctx;

        let t_supply = coldest(self.zones.iter().map(|zone| zone.cooling.setpoint.dry_bulb))
            .less(design.supply_delta_t);
        let (coil_leaving, supply) = coil_and_supply(ctx, design, t_supply)?;

        tracing::debug!(
            t_supply = supply.t(),
            t_coil = coil_leaving.t(),
            w_coil = coil_leaving.w(),
            "cooling design supply air"
        );

        let mut zones = BTreeMap::new();
        for zone in &self.zones {
            let terminal = ZoneTerminal::Vav {
                min_flow: zone.min_flow,
                max_flow: None,
            };
            let balance = terminal
                .serve(ctx, &zone.name, &zone.cooling, &supply)
                .map_err(SizingError::zone(&zone.name))?;
            zones.insert(zone.name.clone(), balance);
        }

        let mut warnings = Vec::new();
        collect_warnings(&zones, &mut warnings);

        let zone_flow = total_flow(zones.values());
        let diversified = zone_flow * design.diversity.into_inner();
        let min_flow = design.min_system_flow.into_inner();
        let system_flow = if diversified > min_flow { diversified } else { min_flow };

        let ventilation = cap_ventilation(
            self.required_ventilation(design.min_ventilation.into_inner()),
            system_flow,
            &mut warnings,
        );

        let return_state = return_air(ctx, &zones)?;
        let returned = AirStream::new(return_state, system_flow).map_err(infeasible_flow)?;

        let mut conditioning = vec![Process::from(CoolingCoil::Outlet {
            dry_bulb: coil_leaving.dry_bulb(),
            humidity_ratio: coil_leaving.humidity_ratio(),
        })];
        conditioning.extend(design.fan.map(Process::from));

        let chain = air_handler(ctx, returned, &design.outdoor, ventilation, conditioning)?;

        let mixed = chain.find("mixing").map_or(return_state, |r| r.outlet.state);
        let cooling_coil = chain.find("cooling coil").map_or(Loads::ZERO, |r| r.loads);
        let fan_heat = chain.find("fan").map_or(Power::ZERO, |r| r.loads.total);
        let ventilation_load = ventilation_load(ventilation, &design.outdoor, &return_state);
        let residual = cooling_coil.total
            + fan_heat
            + Power::new::<watt>(
                system_flow.get::<kilogram_per_second>() * (return_state.h() - chain.outlet.state.h()),
            )
            + ventilation_load;

        tracing::debug!(
            zone_flow = zone_flow.get::<kilogram_per_second>(),
            system_flow = system_flow.get::<kilogram_per_second>(),
            ventilation = ventilation.get::<kilogram_per_second>(),
            coil_w = cooling_coil.total.get::<watt>(),
            residual_w = residual.get::<watt>(),
            "cooling design"
        );

        Ok(CoolingResults {
            zones,
            supply: chain.outlet.state,
            coil_leaving,
            return_air: return_state,
            mixed,
            zone_flow,
            system_flow,
            ventilation,
            cooling_coil,
            fan_heat,
            ventilation_load,
            residual,
            chain,
            fan: design.fan,
            warnings,
        })
    }
}

/// Coldest of a set of temperatures.
pub(super) fn coldest(
    temperatures: impl IntoIterator<Item = ThermodynamicTemperature>,
) -> ThermodynamicTemperature {
    temperatures
        .into_iter()
        .reduce(|a, b| if b < a { b } else { a })
        .unwrap_or(ThermodynamicTemperature::new::<degree_celsius>(f64::NAN))
}

/// Coil-leaving and supply states for a supply temperature.
///
/// Fan heat is taken out ahead of the coil so the fan outlet lands on the
/// supply temperature.
pub(super) fn coil_and_supply<M: PsychroModel>(
    ctx: &AirContext<M>,
    design: &CoolingDesign,
    t_supply: ThermodynamicTemperature,
) -> Result<(MoistAirState, MoistAirState), SizingError> {
    let relative_humidity = design.coil_relative_humidity.into_inner();
    let at = |dry_bulb| {
        ctx.state(StateInput::DryBulbRelativeHumidity {
            dry_bulb,
            relative_humidity,
        })
    };

    let Some(fan) = design.fan else {
        let coil = at(t_supply)?;
        return Ok((coil, coil));
    };

    let rise = fan.temperature_rise(ctx, &at(t_supply)?);
    let coil = at(t_supply.less(rise))?;
    let unit = AirStream::new(coil, MassRate::new::<kilogram_per_second>(1.0))
        .map_err(infeasible_flow)?;
    let supply = Process::from(fan).evaluate(ctx, &unit)?.outlet.state;
    Ok((coil, supply))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::Pressure,
        power::kilowatt,
        pressure::pascal,
        ratio::{percent, ratio},
        specific_heat_capacity::joule_per_kilogram_kelvin,
        temperature_interval::kelvin as delta_kelvin,
    };

    use crate::{
        models::airco::{
            ZoneLoads, ZoneSetpoint,
            system::{RELIEF, ZoneDesign},
        },
        support::psychro::model::Ashrae,
    };

    fn c(t: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(t)
    }

    fn kg_s(m: f64) -> MassRate {
        MassRate::new::<kilogram_per_second>(m)
    }

    fn zone(name: &str, sensible_kw: f64, latent_kw: f64) -> ZoneDesign {
        ZoneDesign::new(
            name,
            ZoneLoads {
                sensible: Power::new::<kilowatt>(sensible_kw),
                latent: Power::new::<kilowatt>(latent_kw),
                setpoint: ZoneSetpoint {
                    dry_bulb: c(23.9),
                    relative_humidity: Some(Ratio::new::<percent>(50.0)),
                },
            },
        )
    }

    fn two_zone_design(ctx: &AirContext<Ashrae>) -> CoolingDesign {
        let outdoor = ctx
            .state(StateInput::DryBulbWetBulb {
                dry_bulb: c(36.1),
                wet_bulb: c(24.4),
            })
            .unwrap();
        CoolingDesign::new(
            outdoor,
            TemperatureInterval::new::<delta_kelvin>(11.1),
            Ratio::new::<percent>(85.0),
        )
        .unwrap()
        .with_fan(
            Fan::new(Pressure::new::<pascal>(747.0), Ratio::new::<percent>(60.0)).unwrap(),
        )
        .with_ventilation(kg_s(1.28))
        .unwrap()
    }

    fn sizer(ctx: AirContext<Ashrae>) -> SystemSizer<Ashrae> {
        SystemSizer::new(ctx, vec![zone("A", 65.9, 16.4), zone("B", 30.3, 5.9)]).unwrap()
    }

    #[test]
    fn two_zone_peak() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let results = sizer(ctx).design_cooling(&two_zone_design(&ctx))?;

        let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
        let dt = 23.9 - results.supply.t();
        assert_relative_eq!(results.supply.t(), 12.8, epsilon = 0.05);
        assert_relative_eq!(
            results.design_flow("A").unwrap().get::<kilogram_per_second>(),
            65_900.0 / (cp * dt),
            max_relative = 1e-9
        );

        let sum = results.zones.values().map(|z| z.supply.m()).sum::<f64>();
        assert_relative_eq!(results.system_flow.get::<kilogram_per_second>(), sum, max_relative = 1e-12);
        assert_eq!(results.zone_flow, results.system_flow);

        assert!(results.coil_leaving.t() < results.supply.t());
        assert_relative_eq!(
            results.coil_leaving.relative_humidity().get::<ratio>(),
            0.85,
            epsilon = 1e-9
        );
        assert!(results.cooling_coil.total.get::<kilowatt>() < -100.0);
        assert!(results.cooling_coil.latent.get::<watt>() < 0.0);
        assert!(results.fan_heat.get::<watt>() > 0.0);
        assert!(results.ventilation_load.get::<watt>() > 0.0);
        assert!(results.residual.abs() < results.cooling_coil.total.abs() * 1e-6);

        let (name, relief) = &results.chain.exhausted[0];
        assert_eq!(name, RELIEF);
        assert_relative_eq!(relief.m(), 1.28, epsilon = 1e-12);
        assert!(results.warnings.is_empty());
        Ok(())
    }

    #[test]
    fn diversity_and_system_minimum() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let sizer = sizer(ctx);

        let diverse = two_zone_design(&ctx).with_diversity(0.8).unwrap();
        let results = sizer.design_cooling(&diverse)?;
        assert_relative_eq!(
            results.system_flow.get::<kilogram_per_second>(),
            0.8 * results.zone_flow.get::<kilogram_per_second>(),
            max_relative = 1e-12
        );

        let floored = diverse.with_min_system_flow(kg_s(20.0)).unwrap();
        let results = sizer.design_cooling(&floored)?;
        assert_eq!(results.system_flow, kg_s(20.0));
        Ok(())
    }

    #[test]
    fn ventilation_is_capped_at_supply() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let design = two_zone_design(&ctx).with_ventilation(kg_s(50.0)).unwrap();

        let results = sizer(ctx).design_cooling(&design)?;

        assert_eq!(results.ventilation, results.system_flow);
        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::VentilationExceedsSupply { .. }))
        );
        Ok(())
    }

    #[test]
    fn zone_minimum_flow_reheats() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let zones = vec![
            zone("A", 65.9, 16.4),
            zone("B", 1.0, 0.2).with_min_flow(kg_s(0.5)).unwrap(),
        ];
        let results = SystemSizer::new(ctx, zones)?.design_cooling(&two_zone_design(&ctx))?;

        assert!(results.zones["B"].reheat.get::<watt>() > 0.0);
        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::ZoneAtMinimumFlow { zone, .. } if zone == "B"))
        );
        Ok(())
    }
}
