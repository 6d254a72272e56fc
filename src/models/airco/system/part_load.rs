use std::collections::BTreeMap;

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Power},
        mass_rate::kilogram_per_second,
        power::watt,
    },
};

use crate::{
    models::airco::{
        AirStream, ChainResults, Loads, MoistAirState, Process, SizingError, SizingWarning,
        ZoneBalance, ZoneLoads,
        process::{CoolingCoil, Sensible},
        zone::ZoneTerminal,
    },
    support::{
        constraint::{Constrained, ConstraintError, NonNegative, StrictlyPositive},
        psychro::PsychroModel,
    },
};

use super::{
    CoolingResults, SystemSizer, air_handler, cap_ventilation, collect_warnings, infeasible_flow,
    return_air, total_flow,
};

/// How the designed system runs at part load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Supply temperature held, zone flows modulate down to their floors.
    Vav,

    /// Zone flows held at design, each zone reheats.
    ConstantVolume,
}

/// An off-design operating point.
#[derive(Debug, Clone, PartialEq)]
pub struct PartLoad {
    pub operation: Operation,
    pub outdoor: MoistAirState,

    /// Zone loads by zone name. Zones not listed keep their design loads.
    pub loads: BTreeMap<String, ZoneLoads>,

    /// Code-minimum outdoor air.
    pub ventilation: Constrained<MassRate, NonNegative>,

    /// System flow below which a warning is raised.
    pub min_system_flow: Constrained<MassRate, NonNegative>,
}

impl PartLoad {
    pub fn new(operation: Operation, outdoor: MoistAirState) -> Self {
        Self {
            operation,
            outdoor,
            loads: BTreeMap::new(),
            ventilation: NonNegative::zero(),
            min_system_flow: NonNegative::zero(),
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>, loads: ZoneLoads) -> Self {
        self.loads.insert(zone.into(), loads);
        self
    }

    /// # Errors
    ///
    /// Returns an error if `flow` is negative.
    pub fn with_ventilation(self, flow: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            ventilation: NonNegative::new(flow)?,
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
}

/// Result of a part-load run.
#[derive(Debug, Clone, PartialEq)]
pub struct PartLoadResults {
    pub operation: Operation,
    pub zones: BTreeMap<String, ZoneBalance>,
    pub supply: MoistAirState,
    pub return_air: MoistAirState,
    pub mixed: MoistAirState,

    /// Sum of zone flows; no diversity applies off-design.
    pub system_flow: MassRate,

    pub ventilation: MassRate,
    pub chain: ChainResults,

    /// Coil loads; sensible only when the coil runs dry, zero when it is off.
    pub cooling_coil: Loads,

    pub fan_heat: Power,

    /// Reheat per zone, in zone-name order.
    pub reheat: Vec<(String, Power)>,

    pub warnings: Vec<SizingWarning>,
}

impl PartLoadResults {
    #[must_use]
    pub fn total_reheat(&self) -> Power {
        self.reheat
            .iter()
            .fold(Power::ZERO, |acc, (_, reheat)| acc + *reheat)
    }
}

impl<M: PsychroModel> SystemSizer<M> {
    /// Runs a designed system at an off-design point.
    ///
    /// The coil-leaving state stays at its design value. Under VAV each zone
    /// draws what its sensible load needs at the design supply temperature,
    /// floored at its minimum and reheated when the floor governs. Under
    /// CAV every zone keeps its own design flow and reheats to the supply
    /// temperature it needs, so the system carries the undiversified
    /// [`zone_flow`](CoolingResults::zone_flow) rather than the diversified
    /// design system flow.
    ///
    /// Mixed air that is already drier than the coil-leaving state is only
    /// cooled sensibly, and mixed air at or below the coil-leaving dry-bulb
    /// skips the coil. Both raise a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::UnknownZone`] if `part` names a zone that is
    /// not part of the design, or another [`SizingError`] if a zone or the
    /// air handler cannot be evaluated.
    pub fn part_load(
        &self,
        design: &CoolingResults,
        part: &PartLoad,
    ) -> Result<PartLoadResults, SizingError> {
        let ctx = &self.ctx;

        if let Some(unknown) = part
            .loads
            .keys()
            .find(|name| !self.zones.iter().any(|zone| &zone.name == *name))
        {
            return Err(SizingError::UnknownZone {
                zone: unknown.clone(),
            });
        }

        let mut zones = BTreeMap::new();
        for zone in &self.zones {
            let loads = part.loads.get(&zone.name).copied().unwrap_or(zone.cooling);
            let design_flow =
                design
                    .design_flow(&zone.name)
                    .ok_or_else(|| SizingError::UnknownZone {
                        zone: zone.name.clone(),
                    })?;

            let terminal = match part.operation {
                Operation::Vav => ZoneTerminal::Vav {
                    min_flow: NonNegative::new(zone.floor(design_flow)).map_err(infeasible_flow)?,
                    max_flow: Some(design_flow),
                },
                Operation::ConstantVolume => ZoneTerminal::ConstantVolume {
                    flow: StrictlyPositive::new(design_flow).map_err(infeasible_flow)?,
                },
            };

            let balance = terminal
                .serve(ctx, &zone.name, &loads, &design.supply)
                .map_err(SizingError::zone(&zone.name))?;
            zones.insert(zone.name.clone(), balance);
        }

        let mut warnings = Vec::new();
        collect_warnings(&zones, &mut warnings);

        let system_flow = total_flow(zones.values());
        let minimum = part.min_system_flow.into_inner();
        if system_flow < minimum {
            SizingWarning::SystemBelowMinimum {
                flow: system_flow,
                minimum,
            }
            .record(&mut warnings);
        }

        let ventilation = cap_ventilation(
            self.required_ventilation(part.ventilation.into_inner()),
            system_flow,
            &mut warnings,
        );

        let return_state = return_air(ctx, &zones)?;
        let returned = AirStream::new(return_state, system_flow).map_err(infeasible_flow)?;

        let mixed = air_handler(ctx, returned, &part.outdoor, ventilation, [])?
            .outlet
            .state;
        let mut conditioning = coil_at(&mixed, &design.coil_leaving, &mut warnings)
            .into_iter()
            .collect::<Vec<_>>();
        conditioning.extend(design.fan.map(Process::from));
        let chain = air_handler(ctx, returned, &part.outdoor, ventilation, conditioning)?;

        let cooling_coil = chain
            .find("cooling coil")
            .or_else(|| chain.find("sensible"))
            .map_or(Loads::ZERO, |r| r.loads);
        let fan_heat = chain.find("fan").map_or(Power::ZERO, |r| r.loads.total);
        let reheat: Vec<(String, Power)> = zones
            .iter()
            .map(|(name, balance)| (name.clone(), balance.reheat))
            .collect();

        tracing::debug!(
            operation = ?part.operation,
            system_flow = system_flow.get::<kilogram_per_second>(),
            coil_w = cooling_coil.total.get::<watt>(),
            "part load"
        );

        Ok(PartLoadResults {
            operation: part.operation,
            zones,
            supply: design.supply,
            return_air: return_state,
            mixed,
            system_flow,
            ventilation,
            chain,
            cooling_coil,
            fan_heat,
            reheat,
            warnings,
        })
    }
}

/// The coil step that brings `mixed` to the design coil-leaving state.
///
/// Air already drier than the coil-leaving state is cooled sensibly, and
/// air already at or below the coil-leaving dry-bulb bypasses the coil.
fn coil_at(
    mixed: &MoistAirState,
    coil_leaving: &MoistAirState,
    warnings: &mut Vec<SizingWarning>,
) -> Option<Process> {
    if mixed.t() <= coil_leaving.t() {
        SizingWarning::CoilIdle {
            mixed: mixed.dry_bulb(),
            coil_leaving: coil_leaving.dry_bulb(),
        }
        .record(warnings);
        return None;
    }

    if mixed.w() <= coil_leaving.w() {
        SizingWarning::CoilDry {
            mixed: mixed.humidity_ratio(),
            coil_leaving: coil_leaving.humidity_ratio(),
        }
        .record(warnings);
        return Some(Process::from(Sensible::ToDryBulb(coil_leaving.dry_bulb())));
    }

    Some(Process::from(CoolingCoil::Outlet {
        dry_bulb: coil_leaving.dry_bulb(),
        humidity_ratio: coil_leaving.humidity_ratio(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{Pressure, Ratio, TemperatureInterval, ThermodynamicTemperature},
        power::kilowatt,
        pressure::pascal,
        ratio::percent,
        temperature_interval::kelvin as delta_kelvin,
        thermodynamic_temperature::degree_celsius,
    };

    use crate::{
        models::airco::{
            AirContext, ZoneSetpoint,
            process::Fan,
            system::{CoolingDesign, ZoneDesign},
        },
        support::psychro::{StateInput, model::Ashrae},
    };

    fn c(t: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(t)
    }

    fn kg_s(m: f64) -> MassRate {
        MassRate::new::<kilogram_per_second>(m)
    }

    fn loads(sensible_kw: f64, latent_kw: f64) -> ZoneLoads {
        ZoneLoads {
            sensible: Power::new::<kilowatt>(sensible_kw),
            latent: Power::new::<kilowatt>(latent_kw),
            setpoint: ZoneSetpoint {
                dry_bulb: c(23.9),
                relative_humidity: Some(Ratio::new::<percent>(50.0)),
            },
        }
    }

    fn designed(ctx: AirContext<Ashrae>) -> (SystemSizer<Ashrae>, CoolingResults) {
        designed_with_diversity(ctx, 1.0)
    }

    fn designed_with_diversity(
        ctx: AirContext<Ashrae>,
        diversity: f64,
    ) -> (SystemSizer<Ashrae>, CoolingResults) {
        let zones = vec![
            ZoneDesign::new("A", loads(65.9, 16.4))
                .with_min_flow_fraction(0.6)
                .unwrap(),
            ZoneDesign::new("B", loads(30.3, 5.9))
                .with_min_flow_fraction(0.6)
                .unwrap(),
        ];
        let sizer = SystemSizer::new(ctx, zones).unwrap();
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
        .with_fan(Fan::new(Pressure::new::<pascal>(747.0), Ratio::new::<percent>(60.0)).unwrap())
        .with_ventilation(kg_s(1.28))
        .unwrap()
        .with_diversity(diversity)
        .unwrap();
        let results = sizer.design_cooling(&design).unwrap();
        (sizer, results)
    }

    fn mild(ctx: &AirContext<Ashrae>) -> MoistAirState {
        ctx.state(StateInput::DryBulbHumidityRatio {
            dry_bulb: c(25.0),
            humidity_ratio: Ratio::new::<uom::si::ratio::ratio>(0.0126),
        })
        .unwrap()
    }

    #[test]
    fn vav_modulates_flow() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);

        let part = PartLoad::new(Operation::Vav, mild(&ctx))
            .with_zone("A", loads(41.9, 10.5))
            .with_zone("B", loads(26.7, 5.9))
            .with_ventilation(kg_s(1.28))
            .unwrap();
        let results = sizer.part_load(&design, &part)?;

        let sum = results.zones.values().map(|z| z.supply.m()).sum::<f64>();
        assert_relative_eq!(
            results.system_flow.get::<kilogram_per_second>(),
            sum,
            max_relative = 1e-12
        );
        assert!(results.system_flow < design.system_flow);

        for zone in results.zones.values() {
            assert!(zone.supply.m_da() <= design.design_flow(&zone.zone).unwrap());
            assert_relative_eq!(zone.supply.state.w(), design.supply.w(), max_relative = 1e-12);
        }
        assert_eq!(results.total_reheat(), Power::ZERO);
        assert!(results.cooling_coil.total < Power::ZERO);
        Ok(())
    }

    #[test]
    fn vav_floor_governs_at_low_load() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);

        let part = PartLoad::new(Operation::Vav, mild(&ctx)).with_zone("B", loads(5.0, 2.0));
        let results = sizer.part_load(&design, &part)?;

        let b = &results.zones["B"];
        assert_relative_eq!(
            b.supply.m(),
            0.6 * design.design_flow("B").unwrap().get::<kilogram_per_second>(),
            max_relative = 1e-12
        );
        assert!(b.reheat > Power::ZERO);
        assert_relative_eq!(b.supply.state.w(), design.supply.w(), max_relative = 1e-12);
        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::ZoneAtMinimumFlow { zone, .. } if zone == "B"))
        );
        Ok(())
    }

    #[test]
    fn cav_holds_flow_and_reheats() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);

        let part = PartLoad::new(Operation::ConstantVolume, mild(&ctx))
            .with_zone("A", loads(41.9, 10.5))
            .with_zone("B", loads(26.7, 5.9));
        let results = sizer.part_load(&design, &part)?;

        assert_eq!(results.system_flow, design.system_flow);
        for (name, reheat) in &results.reheat {
            assert!(*reheat > Power::ZERO, "zone {name} should reheat");
        }
        Ok(())
    }

    #[test]
    fn cav_carries_undiversified_zone_flows() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed_with_diversity(ctx, 0.8);
        assert!(design.system_flow < design.zone_flow);

        let part = PartLoad::new(Operation::ConstantVolume, mild(&ctx))
            .with_zone("A", loads(41.9, 10.5));
        let results = sizer.part_load(&design, &part)?;

        assert_relative_eq!(
            results.system_flow.get::<kilogram_per_second>(),
            design.zone_flow.get::<kilogram_per_second>(),
            max_relative = 1e-12
        );
        for (name, zone) in &results.zones {
            assert_eq!(Some(zone.supply.m_da()), design.design_flow(name));
        }
        Ok(())
    }

    #[test]
    fn dry_mixed_air_runs_the_coil_dry() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);
        let dry_day = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: c(28.0),
                relative_humidity: Ratio::new::<percent>(20.0),
            })
            .unwrap();

        let part = PartLoad::new(Operation::Vav, dry_day)
            .with_zone("A", loads(40.0, 0.0))
            .with_zone("B", loads(20.0, 0.0))
            .with_ventilation(kg_s(1.28))
            .unwrap();
        let results = sizer.part_load(&design, &part)?;

        assert!(results.mixed.w() < design.coil_leaving.w());
        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::CoilDry { .. }))
        );
        assert!(results.chain.find("cooling coil").is_none());
        assert!(results.cooling_coil.total < Power::ZERO);
        assert_eq!(results.cooling_coil.latent, Power::ZERO);
        assert_eq!(results.chain.outlet.state.humidity_ratio(), results.mixed.humidity_ratio());
        Ok(())
    }

    #[test]
    fn cold_mixed_air_skips_the_coil() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);
        let cold_day = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: c(-5.0),
                relative_humidity: Ratio::new::<percent>(50.0),
            })
            .unwrap();

        let part = PartLoad::new(Operation::Vav, cold_day)
            .with_zone("A", loads(20.0, 2.0))
            .with_zone("B", loads(10.0, 1.0))
            .with_ventilation(kg_s(4.0))
            .unwrap();
        let results = sizer.part_load(&design, &part)?;

        assert!(results.mixed.t() <= design.coil_leaving.t());
        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::CoilIdle { .. }))
        );
        assert_eq!(results.cooling_coil, Loads::ZERO);
        assert!(results.chain.find("sensible").is_none());
        assert!(results.fan_heat > Power::ZERO);
        Ok(())
    }

    #[test]
    fn unknown_zone() {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);

        let part = PartLoad::new(Operation::Vav, mild(&ctx)).with_zone("C", loads(1.0, 0.0));
        assert!(matches!(
            sizer.part_load(&design, &part),
            Err(SizingError::UnknownZone { zone }) if zone == "C"
        ));
    }

    #[test]
    fn system_below_minimum_warns() -> Result<(), SizingError> {
        let ctx = AirContext::standard(Ashrae);
        let (sizer, design) = designed(ctx);

        let part = PartLoad::new(Operation::Vav, mild(&ctx))
            .with_zone("A", loads(20.0, 5.0))
            .with_min_system_flow(design.system_flow)
            .unwrap();
        let results = sizer.part_load(&design, &part)?;

        assert!(
            results
                .warnings
                .iter()
                .any(|w| matches!(w, SizingWarning::SystemBelowMinimum { .. }))
        );
        Ok(())
    }
}
