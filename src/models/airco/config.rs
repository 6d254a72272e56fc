use uom::si::{
    available_energy::kilojoule_per_kilogram,
    f64::{Length, Power, Pressure, Ratio, SpecificHeatCapacity, TemperatureInterval},
    length::meter,
    power::watt,
    pressure::kilopascal,
    ratio::{percent, ratio},
    specific_heat_capacity::joule_per_kilogram_kelvin,
    temperature_interval::kelvin as delta_kelvin,
};

use crate::support::{
    psychro::{PsychroModel, StateInput},
    root::SolverConfig,
    units::SpecificEnthalpy,
};

use super::{InvalidStateError, MoistAirState};

/// Standard sea-level barometric pressure.
const STANDARD_PRESSURE_KPA: f64 = 101.325;

/// Constants, tolerances and solver bounds shared by every evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AircoConfig {
    /// Barometric pressure.
    pub pressure: Pressure,

    /// Specific heat of moist air used by load balances.
    pub cp: SpecificHeatCapacity,

    /// Latent heat of vaporisation used by load balances.
    pub h_fg: SpecificEnthalpy,

    /// Comparison and balance tolerances.
    pub tolerance: Tolerances,

    /// Bounds for iterative coil and humidifier solves.
    pub solver: SolverConfig,
}

impl Default for AircoConfig {
    fn default() -> Self {
        Self {
            pressure: Pressure::new::<kilopascal>(STANDARD_PRESSURE_KPA),
            cp: SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(1006.0),
            h_fg: SpecificEnthalpy::new::<kilojoule_per_kilogram>(2501.0),
            tolerance: Tolerances::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl AircoConfig {
    /// Returns this configuration at a different barometric pressure.
    #[must_use]
    pub fn with_pressure(self, pressure: Pressure) -> Self {
        Self { pressure, ..self }
    }

    /// Returns this configuration at the standard-atmosphere pressure for
    /// an elevation above sea level.
    #[must_use]
    pub fn at_altitude(self, elevation: Length) -> Self {
        let z = elevation.get::<meter>();
        let p = STANDARD_PRESSURE_KPA * (1.0 - 2.255_77e-5 * z).powf(5.2559);
        self.with_pressure(Pressure::new::<kilopascal>(p))
    }
}

/// Comparison and balance tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Dry-bulb agreement for approximate state equality.
    pub temperature: TemperatureInterval,

    /// Humidity-ratio agreement for approximate state equality.
    pub humidity_ratio: Ratio,

    /// Relative humidity margin before a zone humidity setpoint counts as missed.
    pub relative_humidity: Ratio,

    /// Absolute energy-balance tolerance for a process step.
    pub energy_abs: Power,

    /// Energy-balance tolerance relative to the largest enthalpy flow.
    pub energy_rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            temperature: TemperatureInterval::new::<delta_kelvin>(1e-6),
            humidity_ratio: Ratio::new::<ratio>(1e-9),
            relative_humidity: Ratio::new::<percent>(1.0),
            energy_abs: Power::new::<watt>(1e-6),
            energy_rel: 1e-9,
        }
    }
}

/// The explicit evaluation context: a property model plus configuration.
#[derive(Debug, Clone, Copy)]
pub struct AirContext<M> {
    pub model: M,
    pub config: AircoConfig,
}

impl<M: PsychroModel> AirContext<M> {
    /// Creates a context from a property model and configuration.
    pub fn new(model: M, config: AircoConfig) -> Self {
        Self { model, config }
    }

    /// Creates a context at standard sea-level conditions.
    pub fn standard(model: M) -> Self {
        Self::new(model, AircoConfig::default())
    }

    /// Resolves a state at the configured barometric pressure.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidStateError`] if the inputs are inconsistent or out
    /// of range. Inputs are never clamped.
    pub fn state(&self, input: StateInput) -> Result<MoistAirState, InvalidStateError> {
        self.state_at(input, self.config.pressure)
    }

    /// Resolves a state at an explicit barometric pressure.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidStateError`] if the inputs are inconsistent or out
    /// of range.
    pub fn state_at(
        &self,
        input: StateInput,
        pressure: Pressure,
    ) -> Result<MoistAirState, InvalidStateError> {
        self.model
            .properties(&input, pressure)
            .map(MoistAirState::from_properties)
            .map_err(|source| InvalidStateError { input, source })
    }
}
