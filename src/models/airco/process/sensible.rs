use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Power, ThermodynamicTemperature},
    power::watt,
    thermodynamic_temperature::degree_celsius,
};

use crate::{
    models::airco::{AirContext, AirStream, ProcessError},
    support::{
        psychro::{PsychroModel, StateInput},
        units::SpecificEnthalpy,
    },
};

use super::{Loads, ProcessOutcome, check_balance, outlet_state};

pub(super) const NAME: &str = "sensible";

/// Sensible-only heating or cooling.
///
/// The humidity ratio passes through unchanged, bit for bit. Cooling below
/// the inlet dew point would condense water and is rejected; model that
/// with a [`CoolingCoil`](super::CoolingCoil) instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sensible {
    /// Heat or cool to a target dry-bulb.
    ToDryBulb(ThermodynamicTemperature),

    /// Add a net heat rate (negative to cool).
    HeatRate(Power),
}

impl Sensible {
    pub(super) fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        let humidity_ratio = inlet.state.humidity_ratio();

        let input = match *self {
            Self::ToDryBulb(dry_bulb) => {
                check_dew_point(inlet, dry_bulb.get::<degree_celsius>())?;
                StateInput::DryBulbHumidityRatio {
                    dry_bulb,
                    humidity_ratio,
                }
            }
            Self::HeatRate(q) => {
                let q = q.get::<watt>();
                if q == 0.0 {
                    return Ok(unchanged(inlet));
                }
                if inlet.m() == 0.0 {
                    return Err(ProcessError::infeasible(
                        NAME,
                        "heat rate applied to a stream with no air",
                    ));
                }
                StateInput::EnthalpyHumidityRatio {
                    enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(
                        inlet.state.h() + q / inlet.m(),
                    ),
                    humidity_ratio,
                }
            }
        };

        let state = outlet_state(ctx, NAME, input)?;
        check_dew_point(inlet, state.t())?;

        let outlet = inlet.with_state(state);
        let loads = Loads::between(ctx, inlet.m_da(), &inlet.state, &state);

        if let Self::HeatRate(q) = *self {
            check_balance(
                ctx,
                NAME,
                inlet.enthalpy_flow(),
                q,
                Power::new::<watt>(0.0),
                outlet.enthalpy_flow(),
            )?;
        }

        Ok(ProcessOutcome {
            outlet,
            loads,
            apparatus: None,
        })
    }
}

fn unchanged(inlet: &AirStream) -> ProcessOutcome {
    ProcessOutcome {
        outlet: *inlet,
        loads: Loads::ZERO,
        apparatus: None,
    }
}

fn check_dew_point(inlet: &AirStream, t_out: f64) -> Result<(), ProcessError> {
    match inlet.state.dew_point() {
        Some(td) if t_out < td.get::<degree_celsius>() => Err(ProcessError::infeasible(
            NAME,
            format!(
                "cooling to {t_out:.3} °C crosses the inlet dew point {:.3} °C; use a cooling coil",
                td.get::<degree_celsius>()
            ),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use uom::si::{
        f64::{MassRate, Ratio},
        mass_rate::kilogram_per_second,
        power::kilowatt,
        ratio::percent,
    };

    use crate::{models::airco::Process, support::psychro::model::Ashrae};

    fn inlet(ctx: &AirContext<Ashrae>, t: f64, rh: f64, m: f64) -> AirStream {
        let state = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(t),
                relative_humidity: Ratio::new::<percent>(rh),
            })
            .unwrap();
        AirStream::new(state, MassRate::new::<kilogram_per_second>(m)).unwrap()
    }

    #[test]
    fn reheat_to_target() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let air = inlet(&ctx, 12.0, 95.0, 1.5);

        let out = Process::Sensible(Sensible::ToDryBulb(ThermodynamicTemperature::new::<
            degree_celsius,
        >(18.0)))
        .evaluate(&ctx, &air)?;

        assert_eq!(out.outlet.state.humidity_ratio(), air.state.humidity_ratio());
        assert_eq!(out.loads.latent.get::<watt>(), 0.0);
        assert_relative_eq!(
            out.loads.sensible.get::<kilowatt>(),
            1.5 * (1.006 + 1.86 * air.state.w()) * 6.0,
            epsilon = 1e-9
        );
        Ok(())
    }

    #[test]
    fn heat_rate_adds_enthalpy() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let air = inlet(&ctx, 5.0, 60.0, 2.0);

        let out = Sensible::HeatRate(Power::new::<kilowatt>(20.0)).evaluate(&ctx, &air)?;

        assert_relative_eq!(out.loads.total.get::<kilowatt>(), 20.0, epsilon = 1e-9);
        assert!(out.outlet.state.t() > 14.0);
        Ok(())
    }

    #[test]
    fn cooling_below_dew_point_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let air = inlet(&ctx, 26.0, 60.0, 1.0);

        let result = Sensible::ToDryBulb(ThermodynamicTemperature::new::<degree_celsius>(12.0))
            .evaluate(&ctx, &air);
        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));

        let result = Sensible::HeatRate(Power::new::<kilowatt>(-20.0)).evaluate(&ctx, &air);
        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }

    #[test]
    fn heat_without_air_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let air = inlet(&ctx, 20.0, 50.0, 0.0);

        let result = Sensible::HeatRate(Power::new::<kilowatt>(1.0)).evaluate(&ctx, &air);
        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }

    proptest! {
        #[test]
        fn humidity_ratio_is_exactly_preserved(
            t in 0.0..40.0_f64,
            rh in 5.0..60.0_f64,
            q_kw in -5.0..30.0_f64,
            m in 0.5..5.0_f64,
        ) {
            let ctx = AirContext::standard(Ashrae);
            let air = inlet(&ctx, t, rh, m);

            if let Ok(out) = Sensible::HeatRate(Power::new::<kilowatt>(q_kw)).evaluate(&ctx, &air) {
                prop_assert_eq!(out.outlet.state.humidity_ratio(), air.state.humidity_ratio());
                prop_assert_eq!(out.outlet.m_da(), air.m_da());
            }
        }
    }
}
