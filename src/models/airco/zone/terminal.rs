use uom::si::{
    f64::{MassRate, Power},
    mass_rate::kilogram_per_second,
    power::watt,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    temperature_interval::kelvin as delta_kelvin,
    thermodynamic_temperature::degree_celsius,
};

use crate::{
    models::airco::{
        AirContext, AirStream, MoistAirState, Process, SizingWarning, ZoneError,
        process::Sensible,
    },
    support::{
        constraint::{Constrained, NonNegative, StrictlyPositive},
        psychro::PsychroModel,
    },
};

use super::{SupplySpec, ZoneBalance, ZoneLoads, celsius, infeasible};

/// How a zone draws air from a common supply duct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneTerminal {
    /// Variable-volume box with a minimum flow and sensible reheat.
    Vav {
        min_flow: Constrained<MassRate, NonNegative>,

        /// Flow the box is sized for; exceeding it is only a warning.
        max_flow: Option<MassRate>,
    },

    /// Constant-volume box reheating to the temperature the zone needs.
    ConstantVolume {
        flow: Constrained<MassRate, StrictlyPositive>,
    },
}

impl ZoneTerminal {
    /// Serves a zone from supply air at `supply`.
    ///
    /// A VAV box delivers the flow that absorbs the sensible load at the
    /// supply temperature. When that is below its minimum, or the zone needs
    /// heat, it delivers the minimum and reheats to the temperature the zone
    /// needs. A constant-volume box always reheats to that temperature.
    /// Supply air that is too warm to cool the zone is delivered as is and
    /// the zone floats above its setpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the zone cannot be served at all, for
    /// example a heating load on a VAV box without a minimum flow.
    pub fn serve<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        zone: &str,
        loads: &ZoneLoads,
        supply: &MoistAirState,
    ) -> Result<ZoneBalance, ZoneError> {
        let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
        let qs = loads.sensible.get::<watt>();
        let t_zone = loads.setpoint.dry_bulb.get::<degree_celsius>();
        let dt = t_zone - supply.t();

        match *self {
            Self::Vav { min_flow, max_flow } => {
                let min = min_flow.into_inner().get::<kilogram_per_second>();
                let mut warnings = Vec::new();

                if qs > 0.0 && dt <= 0.0 {
                    too_warm(zone, loads, supply, &mut warnings);
                    let stream = flow(zone, *supply, min)?;
                    return with_warnings(ZoneBalance::floating(ctx, zone, loads, stream), warnings);
                }

                let required = if qs > 0.0 { qs / (cp * dt) } else { 0.0 };

                if let Some(max) = max_flow {
                    if required > max.get::<kilogram_per_second>() {
                        SizingWarning::ZoneFlowExceedsDesign {
                            zone: zone.to_owned(),
                            required: kg_s(required),
                            maximum: max,
                        }
                        .record(&mut warnings);
                    }
                }

                if required >= min && required > 0.0 {
                    return with_warnings(
                        ZoneBalance::solve(ctx, zone, loads, SupplySpec::State(*supply)),
                        warnings,
                    );
                }

                if min <= 0.0 {
                    return Err(infeasible(
                        zone,
                        "zone has no cooling load and its terminal has no minimum flow",
                    ));
                }
                SizingWarning::ZoneAtMinimumFlow {
                    zone: zone.to_owned(),
                    required: kg_s(required),
                }
                .record(&mut warnings);
                with_warnings(reheat(ctx, zone, loads, supply, min), warnings)
            }

            Self::ConstantVolume { flow: fixed } => {
                let m = fixed.into_inner().get::<kilogram_per_second>();
                let t_required = t_zone - qs / (m * cp);
                let tolerance = ctx.config.tolerance.temperature.get::<delta_kelvin>();

                if t_required < supply.t() - tolerance {
                    let mut warnings = Vec::new();
                    too_warm(zone, loads, supply, &mut warnings);
                    let stream = flow(zone, *supply, m)?;
                    return with_warnings(ZoneBalance::floating(ctx, zone, loads, stream), warnings);
                }
                reheat(ctx, zone, loads, supply, m)
            }
        }
    }
}

/// Delivers `m` and reheats it to the temperature the zone needs.
fn reheat<M: PsychroModel>(
    ctx: &AirContext<M>,
    zone: &str,
    loads: &ZoneLoads,
    supply: &MoistAirState,
    m: f64,
) -> Result<ZoneBalance, ZoneError> {
    let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
    let t_zone = loads.setpoint.dry_bulb.get::<degree_celsius>();
    let t_required = (t_zone - loads.sensible.get::<watt>() / (m * cp)).max(supply.t());

    let coil_air = flow(zone, *supply, m)?;
    let heated = Process::from(Sensible::ToDryBulb(celsius(t_required))).evaluate(ctx, &coil_air)?;

    let mut balance = ZoneBalance::solve(
        ctx,
        zone,
        loads,
        SupplySpec::FlowAndHumidityRatio {
            m_da: coil_air.m_da(),
            humidity_ratio: supply.humidity_ratio(),
        },
    )?;
    balance.reheat = heated.loads.total.max(Power::new::<watt>(0.0));
    Ok(balance)
}

fn too_warm(zone: &str, loads: &ZoneLoads, supply: &MoistAirState, warnings: &mut Vec<SizingWarning>) {
    SizingWarning::SupplyTooWarm {
        zone: zone.to_owned(),
        supply: supply.dry_bulb(),
        zone_dry_bulb: loads.setpoint.dry_bulb,
    }
    .record(warnings);
}

fn with_warnings(
    balance: Result<ZoneBalance, ZoneError>,
    mut warnings: Vec<SizingWarning>,
) -> Result<ZoneBalance, ZoneError> {
    balance.map(|mut balance| {
        warnings.append(&mut balance.warnings);
        balance.warnings = warnings;
        balance
    })
}

fn kg_s(m: f64) -> MassRate {
    MassRate::new::<kilogram_per_second>(m)
}

fn flow(zone: &str, state: MoistAirState, m: f64) -> Result<AirStream, ZoneError> {
    AirStream::new(state, kg_s(m)).map_err(|err| infeasible(zone, format!("terminal flow: {err}")))
}
