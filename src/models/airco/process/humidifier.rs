use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{MassRate, Power, Ratio, ThermodynamicTemperature},
    mass_rate::kilogram_per_second,
    power::watt,
    ratio::ratio,
    thermodynamic_temperature::degree_celsius,
};

use crate::{
    models::airco::{AirContext, AirStream, InvalidStateError, ProcessError},
    support::{
        constraint::{Constrained, NonNegative, UnitInterval},
        psychro::{PsychroModel, StateInput, water},
        root,
        units::SpecificEnthalpy,
    },
};

use super::{Loads, ProcessOutcome, check_balance, outlet_state};

pub(super) const NAME: &str = "humidifier";

/// Extra humidity ratio above the inlet searched when targeting a relative
/// humidity; any supersaturated candidate is rejected during the search.
const SEARCH_SPAN: f64 = 0.1;

/// Water or steam injection.
///
/// Steam and spray differ only in the enthalpy of what is injected: steam
/// (see [`water::vapor_enthalpy`]) raises the humidity ratio with little
/// dry-bulb change, while liquid water (see [`water::liquid_enthalpy`])
/// evaporates and cools the air toward its wet-bulb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Humidifier {
    /// Inject a known water mass rate with its specific enthalpy.
    Injection {
        water: Constrained<MassRate, NonNegative>,
        enthalpy: SpecificEnthalpy,
    },

    /// Inject enough water to reach a target humidity ratio.
    ToHumidityRatio {
        humidity_ratio: Ratio,
        water_enthalpy: SpecificEnthalpy,
    },

    /// Inject enough water to reach a target relative humidity.
    ToRelativeHumidity {
        relative_humidity: Constrained<Ratio, UnitInterval>,
        water_enthalpy: SpecificEnthalpy,
    },

    /// Air washer or direct evaporative cooler with a saturation
    /// effectiveness; the outlet moves along the inlet wet-bulb line.
    Evaporative {
        effectiveness: Constrained<f64, UnitInterval>,
    },
}

impl Humidifier {
    pub(super) fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        match *self {
            Self::Injection { water, enthalpy } => {
                inject(ctx, inlet, water.into_inner().get::<kilogram_per_second>(), enthalpy)
            }

            Self::ToHumidityRatio {
                humidity_ratio,
                water_enthalpy,
            } => {
                let dw = humidity_ratio.get::<ratio>() - inlet.state.w();
                if dw < -ctx.config.tolerance.humidity_ratio.get::<ratio>() {
                    return Err(ProcessError::infeasible(
                        NAME,
                        "target humidity ratio is drier than the inlet",
                    ));
                }
                require_air(inlet)?;
                inject(ctx, inlet, inlet.m() * dw.max(0.0), water_enthalpy)
            }

            Self::ToRelativeHumidity {
                relative_humidity,
                water_enthalpy,
            } => {
                let target = relative_humidity.into_inner().get::<ratio>();
                let rh_in = inlet.state.relative_humidity().get::<ratio>();
                if target < rh_in {
                    return Err(ProcessError::infeasible(
                        NAME,
                        "target relative humidity is below the inlet",
                    ));
                }
                require_air(inlet)?;

                let (h_in, w_in) = (inlet.state.h(), inlet.state.w());
                let h_w = water_enthalpy.get::<joule_per_kilogram>();

                // Supersaturated candidates fail and count as overshoot.
                let w_out = root::bisect(
                    |w| {
                        let state = ctx.state(StateInput::EnthalpyHumidityRatio {
                            enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(
                                h_in + (w - w_in) * h_w,
                            ),
                            humidity_ratio: Ratio::new::<ratio>(w),
                        })?;
                        Ok::<_, InvalidStateError>(
                            state.relative_humidity().get::<ratio>() - target,
                        )
                    },
                    [w_in, w_in + SEARCH_SPAN],
                    &ctx.config.solver,
                )
                .map_err(|source| ProcessError::Convergence {
                    process: NAME,
                    source,
                })?;

                inject(ctx, inlet, inlet.m() * (w_out - w_in), water_enthalpy)
            }

            Self::Evaporative { effectiveness } => {
                let wet_bulb = inlet.state.wet_bulb();
                let t_wb = wet_bulb.get::<degree_celsius>();
                if t_wb < 0.0 {
                    return Err(ProcessError::infeasible(
                        NAME,
                        "evaporative cooling needs a wet-bulb above freezing",
                    ));
                }

                let t_in = inlet.state.t();
                let t_out = t_in - effectiveness.into_inner() * (t_in - t_wb);
                let state = outlet_state(
                    ctx,
                    NAME,
                    StateInput::DryBulbWetBulb {
                        dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(t_out),
                        wet_bulb,
                    },
                )?;

                let outlet = inlet.with_state(state);
                let loads = Loads::between(ctx, inlet.m_da(), &inlet.state, &state);
                let h_w = water::liquid_enthalpy(wet_bulb);
                check_balance(
                    ctx,
                    NAME,
                    inlet.enthalpy_flow(),
                    Power::new::<watt>(0.0),
                    loads.water * h_w,
                    outlet.enthalpy_flow(),
                )?;

                Ok(ProcessOutcome {
                    outlet,
                    loads,
                    apparatus: None,
                })
            }
        }
    }
}

fn require_air(inlet: &AirStream) -> Result<(), ProcessError> {
    if inlet.m() == 0.0 {
        Err(ProcessError::infeasible(NAME, "no air to humidify"))
    } else {
        Ok(())
    }
}

/// Injects `m_w` kg/s of water at `h_w` into the stream.
fn inject<M: PsychroModel>(
    ctx: &AirContext<M>,
    inlet: &AirStream,
    m_w: f64,
    h_w: SpecificEnthalpy,
) -> Result<ProcessOutcome, ProcessError> {
    if m_w == 0.0 {
        return Ok(ProcessOutcome {
            outlet: *inlet,
            loads: Loads::ZERO,
            apparatus: None,
        });
    }
    require_air(inlet)?;

    let m = inlet.m();
    let h_w_si = h_w.get::<joule_per_kilogram>();
    let state = outlet_state(
        ctx,
        NAME,
        StateInput::EnthalpyHumidityRatio {
            enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(inlet.state.h() + m_w * h_w_si / m),
            humidity_ratio: Ratio::new::<ratio>(inlet.state.w() + m_w / m),
        },
    )?;

    let outlet = inlet.with_state(state);
    check_balance(
        ctx,
        NAME,
        inlet.enthalpy_flow(),
        Power::new::<watt>(0.0),
        MassRate::new::<kilogram_per_second>(m_w) * h_w,
        outlet.enthalpy_flow(),
    )?;

    Ok(ProcessOutcome {
        outlet,
        loads: Loads::between(ctx, inlet.m_da(), &inlet.state, &state),
        apparatus: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::ratio::percent;

    use crate::{models::airco::Process, support::psychro::model::Ashrae};

    fn t(c: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(c)
    }

    fn winter_air(ctx: &AirContext<Ashrae>) -> AirStream {
        let state = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: t(22.0),
                relative_humidity: Ratio::new::<percent>(15.0),
            })
            .unwrap();
        AirStream::new(state, MassRate::new::<kilogram_per_second>(1.2)).unwrap()
    }

    #[test]
    fn steam_barely_changes_dry_bulb() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = winter_air(&ctx);

        let out = Process::Humidifier(Humidifier::Injection {
            water: NonNegative::new(MassRate::new::<kilogram_per_second>(0.006)).unwrap(),
            enthalpy: water::vapor_enthalpy(t(100.0)),
        })
        .evaluate(&ctx, &inlet)?;

        assert_relative_eq!(
            out.outlet.state.w() - inlet.state.w(),
            0.005,
            epsilon = 1e-15
        );
        assert!((out.outlet.state.t() - 22.0).abs() < 1.0);
        assert_relative_eq!(
            out.loads.water.get::<kilogram_per_second>(),
            0.006,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn spray_cools_toward_wet_bulb() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = winter_air(&ctx);

        let out = Humidifier::ToHumidityRatio {
            humidity_ratio: Ratio::new::<ratio>(inlet.state.w() + 0.003),
            water_enthalpy: water::liquid_enthalpy(t(15.0)),
        }
        .evaluate(&ctx, &inlet)?;

        assert!(out.outlet.state.t() < 22.0);
        assert!(out.outlet.state.t() > inlet.state.wet_bulb().get::<degree_celsius>());
        assert_relative_eq!(
            out.outlet.state.w(),
            inlet.state.w() + 0.003,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn reaches_target_relative_humidity() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = winter_air(&ctx);

        let out = Humidifier::ToRelativeHumidity {
            relative_humidity: UnitInterval::new(Ratio::new::<percent>(45.0)).unwrap(),
            water_enthalpy: water::vapor_enthalpy(t(100.0)),
        }
        .evaluate(&ctx, &inlet)?;

        assert_relative_eq!(
            out.outlet.state.relative_humidity().get::<percent>(),
            45.0,
            epsilon = 1e-6
        );
        Ok(())
    }

    #[test]
    fn evaporative_cooler_follows_wet_bulb() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let hot_dry = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: t(38.0),
                relative_humidity: Ratio::new::<percent>(20.0),
            })
            .unwrap();
        let inlet = AirStream::new(hot_dry, MassRate::new::<kilogram_per_second>(3.0)).unwrap();

        let out = Humidifier::Evaporative {
            effectiveness: UnitInterval::new(0.85).unwrap(),
        }
        .evaluate(&ctx, &inlet)?;

        let t_wb = hot_dry.wet_bulb().get::<degree_celsius>();
        assert_relative_eq!(
            out.outlet.state.t(),
            38.0 - 0.85 * (38.0 - t_wb),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            out.outlet.state.wet_bulb().get::<degree_celsius>(),
            t_wb,
            epsilon = 1e-12
        );
        assert!(out.loads.water.get::<kilogram_per_second>() > 0.0);
        Ok(())
    }

    #[test]
    fn oversaturating_injection_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = winter_air(&ctx);

        let result = Humidifier::Injection {
            water: NonNegative::new(MassRate::new::<kilogram_per_second>(0.05)).unwrap(),
            enthalpy: water::liquid_enthalpy(t(20.0)),
        }
        .evaluate(&ctx, &inlet);

        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }

    #[test]
    fn drier_target_is_infeasible() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = winter_air(&ctx);

        let result = Humidifier::ToHumidityRatio {
            humidity_ratio: Ratio::new::<ratio>(0.0005),
            water_enthalpy: water::liquid_enthalpy(t(20.0)),
        }
        .evaluate(&ctx, &inlet);

        assert!(matches!(result, Err(ProcessError::Infeasible { .. })));
    }
}
