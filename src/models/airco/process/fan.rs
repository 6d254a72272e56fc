use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Power, Pressure, Ratio, TemperatureInterval},
    power::watt,
    pressure::pascal,
    ratio::ratio,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    temperature_interval::kelvin as delta_kelvin,
};

use crate::{
    models::airco::{AirContext, AirStream, MoistAirState, ProcessError},
    support::{
        constraint::{
            Constrained, ConstraintError, StrictlyPositive, UnitIntervalLowerOpen,
        },
        psychro::{PsychroModel, StateInput, water::CP_VAPOR},
        units::SpecificEnthalpy,
    },
};

use super::{Loads, ProcessOutcome, check_balance, outlet_state};

pub(super) const NAME: &str = "fan";

/// Fan heat added to the airstream.
///
/// All shaft power `V̇·Δp/η` ends up as sensible heat in the air. When a
/// motor efficiency is given the motor sits in the airstream and its losses
/// are added as well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fan {
    pub pressure_rise: Constrained<Pressure, StrictlyPositive>,
    pub efficiency: Constrained<Ratio, UnitIntervalLowerOpen>,
    pub motor_efficiency: Option<Constrained<Ratio, UnitIntervalLowerOpen>>,
}

impl Fan {
    /// Creates a fan with its motor outside the airstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the pressure rise is not positive or the
    /// efficiency is outside `(0, 1]`.
    pub fn new(pressure_rise: Pressure, efficiency: Ratio) -> Result<Self, ConstraintError> {
        Ok(Self {
            pressure_rise: StrictlyPositive::new(pressure_rise)?,
            efficiency: UnitIntervalLowerOpen::new(efficiency)?,
            motor_efficiency: None,
        })
    }

    /// Places the motor in the airstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the efficiency is outside `(0, 1]`.
    pub fn with_motor(self, efficiency: Ratio) -> Result<Self, ConstraintError> {
        Ok(Self {
            motor_efficiency: Some(UnitIntervalLowerOpen::new(efficiency)?),
            ..self
        })
    }

    fn overall_efficiency(&self) -> f64 {
        let motor = self
            .motor_efficiency
            .map_or(1.0, |eta| eta.into_inner().get::<ratio>());
        self.efficiency.into_inner().get::<ratio>() * motor
    }

    /// Enthalpy added per kg of dry air, `Δp·v/η`.
    fn enthalpy_rise(&self, state: &MoistAirState) -> f64 {
        self.pressure_rise.into_inner().get::<pascal>() * state.specific_volume().value
            / self.overall_efficiency()
    }

    /// Air temperature rise `Δp·v/(η·c)`, independent of the flow.
    ///
    /// `c` is the humid specific heat `cp + W·cp_v`, the slope of enthalpy
    /// against dry-bulb at constant humidity ratio, so the rise matches the
    /// outlet the fan step resolves from enthalpy.
    pub fn temperature_rise<M>(&self, ctx: &AirContext<M>, state: &MoistAirState) -> TemperatureInterval {
        let humid_cp = ctx.config.cp.get::<joule_per_kilogram_kelvin>() + state.w() * CP_VAPOR;
        TemperatureInterval::new::<delta_kelvin>(self.enthalpy_rise(state) / humid_cp)
    }

    /// Power delivered to the airstream.
    #[must_use]
    pub fn power(&self, stream: &AirStream) -> Power {
        Power::new::<watt>(stream.m() * self.enthalpy_rise(&stream.state))
    }

    pub(super) fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        let state = outlet_state(
            ctx,
            NAME,
            StateInput::EnthalpyHumidityRatio {
                enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(
                    inlet.state.h() + self.enthalpy_rise(&inlet.state),
                ),
                humidity_ratio: inlet.state.humidity_ratio(),
            },
        )?;

        let outlet = inlet.with_state(state);
        check_balance(
            ctx,
            NAME,
            inlet.enthalpy_flow(),
            self.power(inlet),
            Power::new::<watt>(0.0),
            outlet.enthalpy_flow(),
        )?;

        Ok(ProcessOutcome {
            outlet,
            loads: Loads::between(ctx, inlet.m_da(), &inlet.state, &state),
            apparatus: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{MassRate, ThermodynamicTemperature},
        mass_rate::kilogram_per_second,
        ratio::percent,
        thermodynamic_temperature::degree_celsius,
    };

    use crate::{models::airco::Process, support::psychro::model::Ashrae};

    fn coil_air(ctx: &AirContext<Ashrae>, m: f64) -> AirStream {
        let state = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(12.0),
                relative_humidity: Ratio::new::<percent>(92.0),
            })
            .unwrap();
        AirStream::new(state, MassRate::new::<kilogram_per_second>(m)).unwrap()
    }

    fn supply_fan() -> Fan {
        Fan::new(Pressure::new::<pascal>(1000.0), Ratio::new::<percent>(65.0))
            .unwrap()
            .with_motor(Ratio::new::<percent>(90.0))
            .unwrap()
    }

    #[test]
    fn temperature_rise_is_independent_of_flow() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let fan = Process::Fan(supply_fan());

        let small = fan.evaluate(&ctx, &coil_air(&ctx, 0.5))?;
        let large = fan.evaluate(&ctx, &coil_air(&ctx, 8.0))?;

        assert_relative_eq!(
            small.outlet.state.t(),
            large.outlet.state.t(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            large.loads.total.get::<watt>(),
            16.0 * small.loads.total.get::<watt>(),
            max_relative = 1e-12
        );
        Ok(())
    }

    #[test]
    fn matches_cp_estimate() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let air = coil_air(&ctx, 2.0);
        let fan = supply_fan();

        let out = Process::Fan(fan).evaluate(&ctx, &air)?;
        let rise = fan.temperature_rise(&ctx, &air.state).get::<delta_kelvin>();

        // About 1.4 K for 1 kPa at 58.5 % overall efficiency.
        assert_relative_eq!(rise, 1.4, epsilon = 0.05);
        assert_relative_eq!(out.outlet.state.t() - 12.0, rise, epsilon = 0.05);
        assert_eq!(out.outlet.state.humidity_ratio(), air.state.humidity_ratio());
        assert_relative_eq!(
            out.loads.total.get::<watt>(),
            fan.power(&air).get::<watt>(),
            max_relative = 1e-9
        );
        Ok(())
    }

    #[test]
    fn temperature_rise_matches_evaluated_outlet() -> Result<(), ProcessError> {
        let ctx = AirContext::standard(Ashrae);
        let humid = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(24.0),
                relative_humidity: Ratio::new::<percent>(95.0),
            })
            .unwrap();
        let air = AirStream::new(humid, MassRate::new::<kilogram_per_second>(3.0)).unwrap();
        let fan = supply_fan();

        let out = Process::Fan(fan).evaluate(&ctx, &air)?;
        assert_relative_eq!(
            out.outlet.state.t() - air.state.t(),
            fan.temperature_rise(&ctx, &air.state).get::<delta_kelvin>(),
            max_relative = 1e-9
        );
        Ok(())
    }

    #[test]
    fn zero_efficiency_is_rejected() {
        assert!(Fan::new(Pressure::new::<pascal>(500.0), Ratio::new::<percent>(0.0)).is_err());
        assert!(Fan::new(Pressure::new::<pascal>(0.0), Ratio::new::<percent>(60.0)).is_err());
    }
}
