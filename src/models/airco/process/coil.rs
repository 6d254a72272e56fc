use uom::si::{
    f64::{Power, Ratio, ThermodynamicTemperature},
    power::watt,
    ratio::ratio,
    thermodynamic_temperature::degree_celsius,
};

use crate::{
    models::airco::{AirContext, AirStream, InvalidStateError, MoistAirState, ProcessError},
    support::{
        constraint::{Constrained, StrictlyPositive, UnitInterval},
        psychro::{PsychroModel, StateInput},
        root,
    },
};

use super::{Loads, ProcessOutcome, outlet_state, saturated};

pub(super) const NAME: &str = "cooling coil";

/// Samples along the extended process line when locating saturation.
const SCAN_STEPS: u32 = 64;

/// Cooling with dehumidification.
///
/// Loads are reported from the airstream's side: total, sensible and latent
/// are negative, and the water term is the negated condensate rate. The
/// enthalpy carried away by the condensate is neglected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoolingCoil {
    /// The coil-leaving condition is specified directly.
    Outlet {
        dry_bulb: ThermodynamicTemperature,
        humidity_ratio: Ratio,
    },

    /// Apparatus dew point with a bypass factor.
    ///
    /// The outlet dry-bulb and humidity ratio are the bypass-weighted
    /// combination of the inlet and the saturated apparatus state.
    Bypass {
        apparatus_dew_point: ThermodynamicTemperature,
        bypass_factor: Constrained<f64, UnitInterval>,
    },

    /// Apparatus dew point with a required heat-removal capacity.
    ///
    /// The bypass factor that removes exactly `capacity` is found by
    /// bounded bisection.
    Capacity {
        apparatus_dew_point: ThermodynamicTemperature,
        capacity: Constrained<Power, StrictlyPositive>,
    },
}

/// The saturated coil surface condition and the bypass factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Apparatus {
    /// Saturated state at the apparatus dew point.
    pub dew_point: MoistAirState,

    /// Fraction of air passing the coil unaffected.
    pub bypass_factor: f64,
}

impl CoolingCoil {
    pub(super) fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        let (state, apparatus) = match *self {
            Self::Outlet {
                dry_bulb,
                humidity_ratio,
            } => {
                let state = outlet_state(
                    ctx,
                    NAME,
                    StateInput::DryBulbHumidityRatio {
                        dry_bulb,
                        humidity_ratio,
                    },
                )?;
                check_cools(ctx, &inlet.state, &state)?;
                let apparatus = Self::apparatus(ctx, &inlet.state, &state)?;
                (state, apparatus)
            }

            Self::Bypass {
                apparatus_dew_point,
                bypass_factor,
            } => {
                let adp = apparatus_state(ctx, &inlet.state, apparatus_dew_point)?;
                let bf = bypass_factor.into_inner();
                let state = blend(ctx, &inlet.state, &adp, bf)?;
                check_cools(ctx, &inlet.state, &state)?;
                (
                    state,
                    Some(Apparatus {
                        dew_point: adp,
                        bypass_factor: bf,
                    }),
                )
            }

            Self::Capacity {
                apparatus_dew_point,
                capacity,
            } => {
                if inlet.m() == 0.0 {
                    return Err(ProcessError::infeasible(NAME, "capacity with no air"));
                }
                let adp = apparatus_state(ctx, &inlet.state, apparatus_dew_point)?;
                let target = capacity.into_inner().get::<watt>();

                let max = inlet.m() * (inlet.state.h() - adp.h());
                if target > max {
                    return Err(ProcessError::infeasible(
                        NAME,
                        format!(
                            "capacity {target:.1} W exceeds {max:.1} W available down to the apparatus dew point"
                        ),
                    ));
                }

                // Removal falls as the bypass factor rises toward one.
                let bf = root::bisect(
                    |bf| {
                        let state = blend_state(ctx, &inlet.state, &adp, bf)?;
                        Ok::<_, InvalidStateError>(
                            target - inlet.m() * (inlet.state.h() - state.h()),
                        )
                    },
                    [0.0, 1.0],
                    &ctx.config.solver,
                )
                .map_err(|source| ProcessError::Convergence {
                    process: NAME,
                    source,
                })?;

                let state = blend(ctx, &inlet.state, &adp, bf)?;
                (
                    state,
                    Some(Apparatus {
                        dew_point: adp,
                        bypass_factor: bf,
                    }),
                )
            }
        };

        Ok(ProcessOutcome {
            outlet: inlet.with_state(state),
            loads: Loads::between(ctx, inlet.m_da(), &inlet.state, &state),
            apparatus,
        })
    }

    /// Recovers the apparatus dew point and bypass factor from an inlet and
    /// outlet pair.
    ///
    /// The coil process line through both states is extended past the
    /// outlet until it meets the saturation curve. Returns `None` if the
    /// line does not cool or never reaches saturation.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if the intersection solve fails.
    pub fn apparatus<M: PsychroModel>(
        ctx: &AirContext<M>,
        inlet: &MoistAirState,
        outlet: &MoistAirState,
    ) -> Result<Option<Apparatus>, ProcessError> {
        let (t_in, w_in) = (inlet.t(), inlet.w());
        let (dt, dw) = (outlet.t() - t_in, outlet.w() - w_in);
        if dt >= 0.0 || dw > 0.0 {
            return Ok(None);
        }

        // Extend the line until dry-bulb reaches -100 °C or the air is bone dry.
        let s_t = (t_in + 100.0) / -dt;
        let s_max = if dw < 0.0 { s_t.min(w_in / -dw) } else { s_t };

        let point = |s: f64| (t_in + s * dt, w_in + s * dw);
        let excess = |s: f64| -> Result<f64, InvalidStateError> {
            let (t, w) = point(s);
            let sat = saturated(ctx, ThermodynamicTemperature::new::<degree_celsius>(t))?;
            Ok(w - sat.w())
        };

        let s = if excess(1.0).is_ok_and(|e| e >= 0.0) {
            // Saturated outlet: the outlet is the apparatus point.
            1.0
        } else {
            // The extended line can cross saturation twice (in and back out
            // near bone-dry air), so bracket the first crossing by sampling.
            let mut lower = 1.0;
            let mut bracket = None;
            for i in 1..=SCAN_STEPS {
                let s = 1.0 + (s_max - 1.0) * f64::from(i) / f64::from(SCAN_STEPS);
                if excess(s).is_ok_and(|e| e > 0.0) {
                    bracket = Some([lower, s]);
                    break;
                }
                lower = s;
            }
            let Some(bracket) = bracket else {
                return Ok(None);
            };

            root::bisect(excess, bracket, &ctx.config.solver).map_err(|source| {
                ProcessError::Convergence {
                    process: NAME,
                    source,
                }
            })?
        };

        let dew_point = saturated(ctx, ThermodynamicTemperature::new::<degree_celsius>(point(s).0))?;
        let bypass_factor = ((outlet.t() - dew_point.t()) / (t_in - dew_point.t())).clamp(0.0, 1.0);

        Ok(Some(Apparatus {
            dew_point,
            bypass_factor,
        }))
    }
}

/// Resolves the saturated apparatus state and checks it can dehumidify.
fn apparatus_state<M: PsychroModel>(
    ctx: &AirContext<M>,
    inlet: &MoistAirState,
    adp: ThermodynamicTemperature,
) -> Result<MoistAirState, ProcessError> {
    let state = saturated(ctx, adp)?;
    if state.t() >= inlet.t() {
        return Err(ProcessError::infeasible(
            NAME,
            "apparatus dew point is not below the inlet dry-bulb",
        ));
    }
    if state.w() > inlet.w() {
        return Err(ProcessError::infeasible(
            NAME,
            "apparatus dew point is above the inlet dew point; the coil would humidify",
        ));
    }
    Ok(state)
}

fn blend_state<M: PsychroModel>(
    ctx: &AirContext<M>,
    inlet: &MoistAirState,
    adp: &MoistAirState,
    bf: f64,
) -> Result<MoistAirState, InvalidStateError> {
    ctx.state(StateInput::DryBulbHumidityRatio {
        dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(
            bf * inlet.t() + (1.0 - bf) * adp.t(),
        ),
        humidity_ratio: Ratio::new::<ratio>(bf * inlet.w() + (1.0 - bf) * adp.w()),
    })
}

fn blend<M: PsychroModel>(
    ctx: &AirContext<M>,
    inlet: &MoistAirState,
    adp: &MoistAirState,
    bf: f64,
) -> Result<MoistAirState, ProcessError> {
    Ok(blend_state(ctx, inlet, adp, bf)?)
}

/// A coil may only cool and dry the air.
fn check_cools<M>(
    ctx: &AirContext<M>,
    inlet: &MoistAirState,
    outlet: &MoistAirState,
) -> Result<(), ProcessError> {
    let tol = &ctx.config.tolerance;
    if outlet.w() > inlet.w() + tol.humidity_ratio.get::<ratio>() {
        return Err(ProcessError::infeasible(NAME, "outlet is more humid than inlet"));
    }
    let energy_tol = tol.energy_rel * inlet.h().abs();
    if outlet.h() > inlet.h() + energy_tol {
        return Err(ProcessError::infeasible(NAME, "outlet enthalpy exceeds inlet"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use uom::si::{
        f64::MassRate, mass_rate::kilogram_per_second, power::kilowatt, ratio::percent,
    };

    use crate::{models::airco::Process, support::psychro::model::Ashrae};

    fn t(c: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(c)
    }

    fn mixed_air(ctx: &AirContext<Ashrae>, m: f64) -> AirStream {
        let state = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: t(27.0),
                relative_humidity: Ratio::new::<percent>(55.0),
            })
            .unwrap();
        AirStream::new(state, MassRate::new::<kilogram_per_second>(m)).unwrap()
    }

    fn bypass(adp: f64, bf: f64) -> CoolingCoil {
        CoolingCoil::Bypass {
            apparatus_dew_point: t(adp),
            bypass_factor: UnitInterval::new(bf).unwrap(),
        }
    }

    #[test]
    fn bypass_blends_inlet_and_apparatus() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = mixed_air(&ctx, 2.0);

        let out = Process::CoolingCoil(bypass(10.0, 0.2)).evaluate(&ctx, &inlet)?;
        let adp = out.apparatus.unwrap().dew_point;

        assert_relative_eq!(out.outlet.state.t(), 0.2 * 27.0 + 0.8 * 10.0, epsilon = 1e-9);
        assert_relative_eq!(
            out.outlet.state.w(),
            0.2 * inlet.state.w() + 0.8 * adp.w(),
            epsilon = 1e-15
        );

        let loads = out.loads;
        assert!(loads.total.get::<watt>() < 0.0);
        assert!(loads.latent.get::<watt>() < 0.0);
        assert_relative_eq!(
            loads.water.get::<kilogram_per_second>(),
            2.0 * (out.outlet.state.w() - inlet.state.w()),
            epsilon = 1e-15
        );
        Ok(())
    }

    #[test]
    fn capacity_mode_matches_bypass_mode() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = mixed_air(&ctx, 2.0);

        let reference = bypass(10.0, 0.15).evaluate(&ctx, &inlet)?;
        let capacity = reference.loads.heat_removed();

        let solved = CoolingCoil::Capacity {
            apparatus_dew_point: t(10.0),
            capacity: StrictlyPositive::new(capacity).unwrap(),
        }
        .evaluate(&ctx, &inlet)?;

        assert_relative_eq!(
            solved.apparatus.unwrap().bypass_factor,
            0.15,
            epsilon = 1e-8
        );
        assert_relative_eq!(
            solved.loads.total.get::<kilowatt>(),
            reference.loads.total.get::<kilowatt>(),
            epsilon = 1e-6
        );
        Ok(())
    }

    #[test]
    fn capacity_beyond_apparatus_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = mixed_air(&ctx, 1.0);

        let result = CoolingCoil::Capacity {
            apparatus_dew_point: t(10.0),
            capacity: StrictlyPositive::new(Power::new::<kilowatt>(500.0)).unwrap(),
        }
        .evaluate(&ctx, &inlet);

        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }

    #[test]
    fn apparatus_is_recovered_from_outlet() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = mixed_air(&ctx, 1.0);

        let reference = bypass(9.0, 0.25).evaluate(&ctx, &inlet)?;
        let outlet = reference.outlet.state;

        let out = CoolingCoil::Outlet {
            dry_bulb: outlet.dry_bulb(),
            humidity_ratio: outlet.humidity_ratio(),
        }
        .evaluate(&ctx, &inlet)?;
        let apparatus = out.apparatus.unwrap();

        assert_relative_eq!(apparatus.dew_point.t(), 9.0, epsilon = 1e-6);
        assert_relative_eq!(apparatus.bypass_factor, 0.25, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn coil_cannot_humidify() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = mixed_air(&ctx, 1.0);

        // Apparatus dew point above the inlet dew point (about 17 °C).
        let result = bypass(20.0, 0.1).evaluate(&ctx, &inlet);
        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));

        let result = CoolingCoil::Outlet {
            dry_bulb: t(15.0),
            humidity_ratio: Ratio::new::<ratio>(inlet.state.w() + 0.001),
        }
        .evaluate(&ctx, &inlet);
        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }

    proptest! {
        #[test]
        fn sensible_and_latent_sum_to_total(bf in 0.0..=1.0_f64, adp in 2.0..15.0_f64) {
            let ctx = AirContext::standard(Ashrae);
            let inlet = mixed_air(&ctx, 1.8);

            let out = bypass(adp, bf).evaluate(&ctx, &inlet).unwrap();
            let loads = out.loads;

            let sum = loads.sensible.get::<watt>() + loads.latent.get::<watt>();
            prop_assert!((sum - loads.total.get::<watt>()).abs() < 1e-9);
            prop_assert!(
                (loads.total.get::<watt>()
                    - 1.8 * (out.outlet.state.h() - inlet.state.h())).abs() < 1e-9
            );
            prop_assert_eq!(out.outlet.m_da(), inlet.m_da());
        }
    }
}
