//! Zone load balances.
//!
//! A zone is held at its setpoint by supply air that absorbs its loads:
//!
//! ```text
//! Q_sensible = m·cp·(t_zone - t_supply)
//! Q_latent   = m·h_fg·(W_zone - W_supply)
//! ```
//!
//! Loads are heat gains *to the zone*, so a zone that needs heating has a
//! negative sensible load. [`ZoneBalance::solve`] solves these two relations
//! for whatever the [`SupplySpec`] leaves open. [`ZoneTerminal`] layers VAV
//! and constant-volume terminal behaviour on top, with flow floors and
//! sensible reheat.

mod condition_line;
mod terminal;

pub use condition_line::SpaceConditionLine;
pub use terminal::ZoneTerminal;

use uom::{
    ConstZero,
    si::{
        available_energy::joule_per_kilogram,
        f64::{MassRate, Power, Ratio, ThermodynamicTemperature},
        mass_rate::kilogram_per_second,
        power::watt,
        ratio::ratio,
        specific_heat_capacity::joule_per_kilogram_kelvin,
        thermodynamic_temperature::degree_celsius,
    },
};

use crate::support::psychro::{PsychroModel, StateInput};

use super::{
    AirContext, AirStream, InvalidStateError, MoistAirState, SizingWarning, ZoneError,
};

/// The condition a zone is held at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneSetpoint {
    pub dry_bulb: ThermodynamicTemperature,

    /// Humidity setpoint, when the zone has one.
    pub relative_humidity: Option<Ratio>,
}

impl ZoneSetpoint {
    /// The setpoint state, if the setpoint fixes humidity.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidStateError`] if the setpoint is not a valid state.
    pub fn state<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
    ) -> Result<Option<MoistAirState>, InvalidStateError> {
        self.relative_humidity
            .map(|relative_humidity| {
                ctx.state(StateInput::DryBulbRelativeHumidity {
                    dry_bulb: self.dry_bulb,
                    relative_humidity,
                })
            })
            .transpose()
    }
}

/// Sensible and latent gains to a zone, with the zone setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneLoads {
    pub sensible: Power,
    pub latent: Power,
    pub setpoint: ZoneSetpoint,
}

impl ZoneLoads {
    #[must_use]
    pub fn total(&self) -> Power {
        self.sensible + self.latent
    }

    /// Sensible heat ratio, or `None` when the total load is zero.
    #[must_use]
    pub fn shr(&self) -> Option<f64> {
        let total = self.total().get::<watt>();
        (total != 0.0).then(|| self.sensible.get::<watt>() / total)
    }

    /// The same zone with its latent load dropped.
    #[must_use]
    pub fn sensible_only(&self) -> Self {
        Self {
            latent: Power::ZERO,
            ..*self
        }
    }
}

/// What is known about the supply air; the balance solves for the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SupplySpec {
    /// Supply dry-bulb; solves the flow and, from the humidity setpoint,
    /// the supply humidity ratio.
    DryBulb(ThermodynamicTemperature),

    /// Supply flow; solves the supply dry-bulb and, from the humidity
    /// setpoint, the supply humidity ratio.
    MassFlow(MassRate),

    /// Complete supply state; solves the flow and the resulting zone
    /// humidity.
    State(MoistAirState),

    /// Supply flow and humidity ratio; solves the supply dry-bulb and the
    /// resulting zone humidity.
    FlowAndHumidityRatio {
        m_da: MassRate,
        humidity_ratio: Ratio,
    },
}

/// A solved zone: the supply that holds it and the state it ends up in.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneBalance {
    pub zone: String,

    /// Loads the balance was solved for.
    pub loads: ZoneLoads,

    /// Supply air delivered to the zone.
    pub supply: AirStream,

    /// Resulting zone (return) air.
    pub zone_state: MoistAirState,

    /// Sensible heat ratio of the zone loads.
    pub shr: Option<f64>,

    /// Terminal reheat, zero unless a terminal reheated the supply.
    pub reheat: Power,

    pub warnings: Vec<SizingWarning>,
}

impl ZoneBalance {
    /// Solves the zone balance for the unknowns `spec` leaves open.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::MissingHumidity`] when the supply humidity must
    /// come from a humidity setpoint the zone does not have,
    /// [`ZoneError::Infeasible`] when the loads cannot be met with a
    /// positive flow, and [`ZoneError::InvalidState`] when a solved state
    /// is not physical (for example supersaturated zone air).
    pub fn solve<M: PsychroModel>(
        ctx: &AirContext<M>,
        zone: &str,
        loads: &ZoneLoads,
        spec: SupplySpec,
    ) -> Result<Self, ZoneError> {
        let k = Coefficients::new(ctx);
        let qs = loads.sensible.get::<watt>();
        let ql = loads.latent.get::<watt>();
        let t_zone = loads.setpoint.dry_bulb.get::<degree_celsius>();

        let (supply, zone_state) = match spec {
            SupplySpec::DryBulb(dry_bulb) => {
                let setpoint = required_setpoint(ctx, zone, loads)?;
                let t_supply = dry_bulb.get::<degree_celsius>();
                let m = flow_for(zone, qs, k.cp * (t_zone - t_supply))?;
                let w = supply_humidity(zone, setpoint.w() - ql / (m * k.h_fg))?;
                let supply = ctx.state(StateInput::DryBulbHumidityRatio {
                    dry_bulb,
                    humidity_ratio: w,
                })?;
                (stream(zone, supply, m)?, setpoint)
            }

            SupplySpec::MassFlow(m_da) => {
                let setpoint = required_setpoint(ctx, zone, loads)?;
                let m = positive_flow(zone, m_da)?;
                let w = supply_humidity(zone, setpoint.w() - ql / (m * k.h_fg))?;
                let supply = ctx.state(StateInput::DryBulbHumidityRatio {
                    dry_bulb: celsius(t_zone - qs / (m * k.cp)),
                    humidity_ratio: w,
                })?;
                (stream(zone, supply, m)?, setpoint)
            }

            SupplySpec::State(supply) => {
                let m = flow_for(zone, qs, k.cp * (t_zone - supply.t()))?;
                let zone_state = resulting_zone(ctx, loads, supply.w() + ql / (m * k.h_fg))?;
                (stream(zone, supply, m)?, zone_state)
            }

            SupplySpec::FlowAndHumidityRatio {
                m_da,
                humidity_ratio,
            } => {
                let m = positive_flow(zone, m_da)?;
                let supply = ctx.state(StateInput::DryBulbHumidityRatio {
                    dry_bulb: celsius(t_zone - qs / (m * k.cp)),
                    humidity_ratio,
                })?;
                let zone_state = resulting_zone(ctx, loads, supply.w() + ql / (m * k.h_fg))?;
                (stream(zone, supply, m)?, zone_state)
            }
        };

        let mut balance = Self {
            zone: zone.to_owned(),
            loads: *loads,
            supply,
            zone_state,
            shr: loads.shr(),
            reheat: Power::ZERO,
            warnings: Vec::new(),
        };
        balance.check_humidity(ctx);
        Ok(balance)
    }

    /// A zone whose supply cannot hold the dry-bulb setpoint.
    ///
    /// The zone floats to whatever temperature and humidity the delivered
    /// supply produces.
    pub(crate) fn floating<M: PsychroModel>(
        ctx: &AirContext<M>,
        zone: &str,
        loads: &ZoneLoads,
        supply: AirStream,
    ) -> Result<Self, ZoneError> {
        let k = Coefficients::new(ctx);
        let m = supply.m();
        if m <= 0.0 {
            return Err(infeasible(zone, "no supply air to absorb the zone loads"));
        }

        let zone_state = ctx.state(StateInput::DryBulbHumidityRatio {
            dry_bulb: celsius(supply.state.t() + loads.sensible.get::<watt>() / (m * k.cp)),
            humidity_ratio: Ratio::new::<ratio>(
                supply.state.w() + loads.latent.get::<watt>() / (m * k.h_fg),
            ),
        })?;

        let mut balance = Self {
            zone: zone.to_owned(),
            loads: *loads,
            supply,
            zone_state,
            shr: loads.shr(),
            reheat: Power::ZERO,
            warnings: Vec::new(),
        };
        balance.check_humidity(ctx);
        Ok(balance)
    }

    /// Sensible load absorbed by the supply, `m·cp·(t_zone - t_supply)`.
    #[must_use]
    pub fn sensible_absorbed<M>(&self, ctx: &AirContext<M>) -> Power {
        let cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>();
        Power::new::<watt>(self.supply.m() * cp * (self.zone_state.t() - self.supply.state.t()))
    }

    /// Latent load absorbed by the supply, `m·h_fg·(W_zone - W_supply)`.
    #[must_use]
    pub fn latent_absorbed<M>(&self, ctx: &AirContext<M>) -> Power {
        let h_fg = ctx.config.h_fg.get::<joule_per_kilogram>();
        Power::new::<watt>(self.supply.m() * h_fg * (self.zone_state.w() - self.supply.state.w()))
    }

    /// Return air leaving the zone at the supply flow.
    #[must_use]
    pub fn return_air(&self) -> AirStream {
        self.supply.with_state(self.zone_state)
    }

    fn check_humidity<M>(&mut self, ctx: &AirContext<M>) {
        let Some(setpoint) = self.loads.setpoint.relative_humidity else {
            return;
        };
        let achieved = self.zone_state.relative_humidity();
        if achieved > setpoint + ctx.config.tolerance.relative_humidity {
            SizingWarning::HumidityNotMet {
                zone: self.zone.clone(),
                achieved,
                setpoint,
            }
            .record(&mut self.warnings);
        }
    }
}

/// Raw `cp` and `h_fg` in SI units.
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    cp: f64,
    h_fg: f64,
}

impl Coefficients {
    fn new<M>(ctx: &AirContext<M>) -> Self {
        Self {
            cp: ctx.config.cp.get::<joule_per_kilogram_kelvin>(),
            h_fg: ctx.config.h_fg.get::<joule_per_kilogram>(),
        }
    }
}

fn celsius(t: f64) -> ThermodynamicTemperature {
    ThermodynamicTemperature::new::<degree_celsius>(t)
}

fn infeasible(zone: &str, reason: impl Into<String>) -> ZoneError {
    ZoneError::Infeasible {
        zone: zone.to_owned(),
        reason: reason.into(),
    }
}

fn required_setpoint<M: PsychroModel>(
    ctx: &AirContext<M>,
    zone: &str,
    loads: &ZoneLoads,
) -> Result<MoistAirState, ZoneError> {
    loads
        .setpoint
        .state(ctx)?
        .ok_or_else(|| ZoneError::MissingHumidity {
            zone: zone.to_owned(),
        })
}

/// Flow that absorbs `q` with a capacity rate of `c` per kg/s.
fn flow_for(zone: &str, q: f64, c: f64) -> Result<f64, ZoneError> {
    let m = q / c;
    if m.is_finite() && m > 0.0 {
        Ok(m)
    } else {
        Err(infeasible(
            zone,
            format!("a sensible load of {q:.1} W cannot be met by this supply temperature"),
        ))
    }
}

fn positive_flow(zone: &str, m_da: MassRate) -> Result<f64, ZoneError> {
    let m = m_da.get::<kilogram_per_second>();
    if m > 0.0 {
        Ok(m)
    } else {
        Err(infeasible(zone, "supply flow must be positive"))
    }
}

fn supply_humidity(zone: &str, w: f64) -> Result<Ratio, ZoneError> {
    if w < 0.0 {
        return Err(infeasible(
            zone,
            "the latent load needs a negative supply humidity ratio",
        ));
    }
    Ok(Ratio::new::<ratio>(w))
}

fn resulting_zone<M: PsychroModel>(
    ctx: &AirContext<M>,
    loads: &ZoneLoads,
    w: f64,
) -> Result<MoistAirState, ZoneError> {
    Ok(ctx.state(StateInput::DryBulbHumidityRatio {
        dry_bulb: loads.setpoint.dry_bulb,
        humidity_ratio: Ratio::new::<ratio>(w),
    })?)
}

fn stream(zone: &str, state: MoistAirState, m: f64) -> Result<AirStream, ZoneError> {
    AirStream::new(state, MassRate::new::<kilogram_per_second>(m))
        .map_err(|err| infeasible(zone, format!("supply flow: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{power::kilowatt, ratio::percent};

    use crate::support::psychro::model::Ashrae;

    fn loads(sensible_kw: f64, latent_kw: f64, rh: Option<f64>) -> ZoneLoads {
        ZoneLoads {
            sensible: Power::new::<kilowatt>(sensible_kw),
            latent: Power::new::<kilowatt>(latent_kw),
            setpoint: ZoneSetpoint {
                dry_bulb: celsius(24.0),
                relative_humidity: rh.map(Ratio::new::<percent>),
            },
        }
    }

    fn assert_balanced(ctx: &AirContext<Ashrae>, balance: &ZoneBalance) {
        assert_relative_eq!(
            balance.sensible_absorbed(ctx).get::<watt>(),
            balance.loads.sensible.get::<watt>(),
            max_relative = 1e-9,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            balance.latent_absorbed(ctx).get::<watt>(),
            balance.loads.latent.get::<watt>(),
            max_relative = 1e-9,
            epsilon = 1e-6
        );
    }

    #[test]
    fn supply_dry_bulb_gives_flow() -> Result<(), ZoneError> {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(10.0, 2.0, Some(50.0));

        let balance = ZoneBalance::solve(&ctx, "office", &zone, SupplySpec::DryBulb(celsius(13.0)))?;

        // 10 kW / (1006 J/kg·K · 11 K)
        assert_relative_eq!(balance.supply.m(), 0.903_67, epsilon = 1e-4);
        assert_relative_eq!(balance.zone_state.t(), 24.0, epsilon = 1e-9);
        assert!(balance.supply.state.w() < balance.zone_state.w());
        assert_relative_eq!(balance.shr.unwrap(), 10.0 / 12.0, epsilon = 1e-12);
        assert!(balance.warnings.is_empty());
        assert_balanced(&ctx, &balance);
        Ok(())
    }

    #[test]
    fn supply_flow_gives_dry_bulb() -> Result<(), ZoneError> {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(-5.0, 0.0, Some(40.0));

        let balance = ZoneBalance::solve(
            &ctx,
            "lobby",
            &zone,
            SupplySpec::MassFlow(MassRate::new::<kilogram_per_second>(0.5)),
        )?;

        // Heating load means warm supply air.
        assert!(balance.supply.state.t() > 24.0);
        assert_relative_eq!(balance.supply.state.w(), balance.zone_state.w(), epsilon = 1e-15);
        assert_balanced(&ctx, &balance);
        Ok(())
    }

    #[test]
    fn supply_state_gives_zone_humidity() -> Result<(), ZoneError> {
        let ctx = AirContext::standard(Ashrae);
        let supply = ctx.state(StateInput::DryBulbRelativeHumidity {
            dry_bulb: celsius(13.0),
            relative_humidity: Ratio::new::<percent>(90.0),
        })?;
        let zone = loads(8.0, 6.0, Some(50.0));

        let balance = ZoneBalance::solve(&ctx, "kitchen", &zone, SupplySpec::State(supply))?;

        assert_eq!(balance.supply.state, supply);
        assert_balanced(&ctx, &balance);
        assert!(balance.zone_state.relative_humidity() > Ratio::new::<percent>(51.0));
        assert!(matches!(
            balance.warnings.as_slice(),
            [SizingWarning::HumidityNotMet { .. }]
        ));
        Ok(())
    }

    #[test]
    fn flow_and_humidity_ratio() -> Result<(), ZoneError> {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(4.0, 1.0, None);

        let balance = ZoneBalance::solve(
            &ctx,
            "corridor",
            &zone,
            SupplySpec::FlowAndHumidityRatio {
                m_da: MassRate::new::<kilogram_per_second>(0.4),
                humidity_ratio: Ratio::new::<ratio>(0.008),
            },
        )?;

        assert_eq!(balance.supply.state.w(), 0.008);
        assert_balanced(&ctx, &balance);
        Ok(())
    }

    #[test]
    fn missing_humidity_setpoint() {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(4.0, 1.0, None);

        let result = ZoneBalance::solve(&ctx, "store", &zone, SupplySpec::DryBulb(celsius(13.0)));
        assert!(matches!(result, Err(ZoneError::MissingHumidity { .. })));
    }

    #[test]
    fn warm_supply_cannot_cool() {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(4.0, 0.0, Some(50.0));

        let result = ZoneBalance::solve(&ctx, "attic", &zone, SupplySpec::DryBulb(celsius(26.0)));
        assert!(matches!(result, Err(ZoneError::Infeasible { .. })));
    }

    #[test]
    fn zero_sensible_load_with_dry_bulb_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let zone = loads(0.0, 1.0, Some(50.0));

        let result = ZoneBalance::solve(&ctx, "store", &zone, SupplySpec::DryBulb(celsius(13.0)));
        assert!(matches!(result, Err(ZoneError::Infeasible { .. })));
    }
}
