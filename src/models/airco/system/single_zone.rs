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
        ZoneBalance, ZoneError,
        process::{CoolingCoil, Sensible},
        zone::{SpaceConditionLine, SupplySpec},
    },
    support::{
        psychro::{PsychroModel, StateInput},
        units::TemperatureOffset,
    },
};

use super::{
    CoolingDesign, SystemSizer, air_handler, cap_ventilation, infeasible_flow, ventilation_load,
};

/// Result of a single-zone constant-volume design.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleZoneResults {
    pub zone: ZoneBalance,

    /// The zone's space condition line, which the supply state lies on.
    pub line: SpaceConditionLine,

    pub coil_leaving: MoistAirState,
    pub supply: MoistAirState,
    pub return_air: MoistAirState,
    pub mixed: MoistAirState,
    pub system_flow: MassRate,
    pub ventilation: MassRate,
    pub chain: ChainResults,
    pub cooling_coil: Loads,

    /// Heat added after the coil to lift over-dried air back onto the line.
    pub reheat: Power,

    pub fan_heat: Power,

    /// Air handler energy balance, as in [`CoolingResults`](super::CoolingResults).
    pub residual: Power,

    pub warnings: Vec<SizingWarning>,
}

impl<M: PsychroModel> SystemSizer<M> {
    /// Designs a constant-volume system serving a single zone.
    ///
    /// The supply state is the point on the zone's space condition line at
    /// the design supply temperature, so one supply state meets both the
    /// sensible and the latent load. The coil leaves air at that humidity
    /// ratio, the fan temperature rise colder. When that state is drier than
    /// the design coil relative humidity allows, the coil runs colder to
    /// reach the humidity ratio at the coil relative humidity, and a reheat
    /// coil brings the air back up before the fan.
    ///
    /// Diversity does not apply to a single zone.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::Infeasible`] if the sizer does not hold exactly
    /// one zone, the zone loads have no space condition line, or the supply
    /// temperature lies beyond where the line meets saturation.
    pub fn design_single_zone(
        &self,
        design: &CoolingDesign,
    ) -> Result<SingleZoneResults, SizingError> {
        let ctx = &self.ctx;

        let [zone] = self.zones.as_slice() else {
            return Err(SizingError::Infeasible {
                reason: format!(
                    "single-zone design needs exactly one zone, found {}",
                    self.zones.len()
                ),
            });
        };
        let loads = &zone.cooling;

        let zone_state = loads.setpoint.state(ctx)?.ok_or_else(|| {
            SizingError::zone(&zone.name)(ZoneError::MissingHumidity {
                zone: zone.name.clone(),
            })
        })?;
        let line = SpaceConditionLine::from_loads(ctx, zone_state, loads).ok_or_else(|| {
            SizingError::Infeasible {
                reason: format!(
                    "zone {:?} loads have no sensible heat ratio in (0, 1]",
                    zone.name
                ),
            }
        })?;

        let t_supply = loads.setpoint.dry_bulb.less(design.supply_delta_t);
        let target = line
            .state_at(ctx, t_supply)
            .map_err(|err| beyond_saturation(&zone.name, &err))?;

        let t_coil = match design.fan {
            Some(fan) => t_supply.less(fan.temperature_rise(ctx, &target)),
            None => t_supply,
        };
        let on_line = ctx
            .state(StateInput::DryBulbHumidityRatio {
                dry_bulb: t_coil,
                humidity_ratio: target.humidity_ratio(),
            })
            .map_err(|err| beyond_saturation(&zone.name, &err))?;

        let coil_rh = design.coil_relative_humidity.into_inner();
        let needs_reheat = on_line.relative_humidity() < coil_rh;
        let coil_leaving = if needs_reheat {
            ctx.state(StateInput::HumidityRatioRelativeHumidity {
                humidity_ratio: target.humidity_ratio(),
                relative_humidity: coil_rh,
            })?
        } else {
            on_line
        };

        tracing::debug!(
            zone = zone.name.as_str(),
            t_supply = target.t(),
            w_supply = target.w(),
            t_coil = coil_leaving.t(),
            needs_reheat,
            "single-zone supply air"
        );

        let balance = ZoneBalance::solve(ctx, &zone.name, loads, SupplySpec::State(target))
            .map_err(SizingError::zone(&zone.name))?;
        let mut warnings = balance.warnings.clone();

        let system_flow = balance.supply.m_da();
        let minimum = design.min_system_flow.into_inner();
        if system_flow < minimum {
            SizingWarning::SystemBelowMinimum {
                flow: system_flow,
                minimum,
            }
            .record(&mut warnings);
        }

        let ventilation = cap_ventilation(
            self.required_ventilation(design.min_ventilation.into_inner()),
            system_flow,
            &mut warnings,
        );

        let return_state = balance.zone_state;
        let returned = AirStream::new(return_state, system_flow).map_err(infeasible_flow)?;
        let mut conditioning = vec![Process::from(CoolingCoil::Outlet {
            dry_bulb: coil_leaving.dry_bulb(),
            humidity_ratio: coil_leaving.humidity_ratio(),
        })];
        if needs_reheat {
            conditioning.push(Process::from(Sensible::ToDryBulb(t_coil)));
        }
        conditioning.extend(design.fan.map(Process::from));

        let chain = air_handler(ctx, returned, &design.outdoor, ventilation, conditioning)?;

        let mixed = chain.find("mixing").map_or(return_state, |r| r.outlet.state);
        let cooling_coil = chain.find("cooling coil").map_or(Loads::ZERO, |r| r.loads);
        let reheat = chain.find("sensible").map_or(Power::ZERO, |r| r.loads.total);
        let fan_heat = chain.find("fan").map_or(Power::ZERO, |r| r.loads.total);
        let residual = cooling_coil.total
            + reheat
            + fan_heat
            + Power::new::<watt>(
                system_flow.get::<kilogram_per_second>()
                    * (return_state.h() - chain.outlet.state.h()),
            )
            + ventilation_load(ventilation, &design.outdoor, &return_state);

        tracing::debug!(
            system_flow = system_flow.get::<kilogram_per_second>(),
            coil_w = cooling_coil.total.get::<watt>(),
            reheat_w = reheat.get::<watt>(),
            residual_w = residual.get::<watt>(),
            "single-zone design"
        );

        Ok(SingleZoneResults {
            zone: balance,
            line,
            coil_leaving,
            supply: chain.outlet.state,
            return_air: return_state,
            mixed,
            system_flow,
            ventilation,
            cooling_coil,
            reheat,
            fan_heat,
            residual,
            chain,
            warnings,
        })
    }
}

fn beyond_saturation(zone: &str, err: &dyn std::error::Error) -> SizingError {
    SizingError::Infeasible {
        reason: format!(
            "zone {zone:?}: design supply temperature is colder than where the space \
             condition line meets saturation ({err})"
        ),
    }
}
