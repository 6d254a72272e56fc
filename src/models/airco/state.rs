use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{MassRate, Power, Pressure, Ratio, ThermodynamicTemperature, VolumeRate},
    mass_rate::kilogram_per_second,
    power::watt,
    ratio::ratio,
    temperature_interval::kelvin as delta_kelvin,
    thermodynamic_temperature::degree_celsius,
};

use crate::support::{
    constraint::{Constrained, ConstraintError, NonNegative},
    psychro::Properties,
    units::{SpecificEnthalpy, SpecificVolume, TemperatureDifference},
};

use super::Tolerances;

/// An immutable, fully resolved moist-air state.
///
/// Every property comes from a single evaluation of the property model at
/// construction time. Create states with [`AirContext::state`]; processes
/// create new states rather than modifying existing ones.
///
/// [`AirContext::state`]: super::AirContext::state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoistAirState {
    props: Properties,
}

impl MoistAirState {
    pub(crate) fn from_properties(props: Properties) -> Self {
        Self { props }
    }

    pub fn dry_bulb(&self) -> ThermodynamicTemperature {
        self.props.dry_bulb
    }

    pub fn wet_bulb(&self) -> ThermodynamicTemperature {
        self.props.wet_bulb
    }

    /// Dew point, or `None` for perfectly dry air.
    pub fn dew_point(&self) -> Option<ThermodynamicTemperature> {
        self.props.dew_point
    }

    /// Humidity ratio, kg water vapour per kg dry air.
    pub fn humidity_ratio(&self) -> Ratio {
        self.props.humidity_ratio
    }

    pub fn relative_humidity(&self) -> Ratio {
        self.props.relative_humidity
    }

    /// Enthalpy per kg of dry air.
    pub fn enthalpy(&self) -> SpecificEnthalpy {
        self.props.enthalpy
    }

    /// Volume per kg of dry air.
    pub fn specific_volume(&self) -> SpecificVolume {
        self.props.specific_volume
    }

    pub fn pressure(&self) -> Pressure {
        self.props.pressure
    }

    /// The complete property set.
    pub fn properties(&self) -> &Properties {
        &self.props
    }

    /// Returns `true` if dry-bulb and humidity ratio agree within tolerance.
    pub fn approx_eq(&self, other: &Self, tolerance: &Tolerances) -> bool {
        let dt = self.dry_bulb().minus(other.dry_bulb()).get::<delta_kelvin>();
        let dw = (self.w() - other.w()).abs();
        dt.abs() <= tolerance.temperature.get::<delta_kelvin>()
            && dw <= tolerance.humidity_ratio.get::<ratio>()
    }

    pub(crate) fn t(&self) -> f64 {
        self.props.dry_bulb.get::<degree_celsius>()
    }

    pub(crate) fn w(&self) -> f64 {
        self.props.humidity_ratio.get::<ratio>()
    }

    pub(crate) fn h(&self) -> f64 {
        self.props.enthalpy.get::<joule_per_kilogram>()
    }
}

/// A moist-air state carried by a dry-air mass flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirStream {
    pub state: MoistAirState,
    m_da: Constrained<MassRate, NonNegative>,
}

impl AirStream {
    /// Creates a stream from a state and a dry-air mass flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the flow is negative or `NaN`.
    pub fn new(state: MoistAirState, m_da: MassRate) -> Result<Self, ConstraintError> {
        Ok(Self {
            state,
            m_da: NonNegative::new(m_da)?,
        })
    }

    pub(crate) fn from_constrained(
        state: MoistAirState,
        m_da: Constrained<MassRate, NonNegative>,
    ) -> Self {
        Self { state, m_da }
    }

    /// Dry-air mass flow.
    pub fn m_da(&self) -> MassRate {
        *self.m_da.as_ref()
    }

    pub(crate) fn m_da_constrained(&self) -> Constrained<MassRate, NonNegative> {
        self.m_da
    }

    /// Volume flow of moist air.
    pub fn volume_flow(&self) -> VolumeRate {
        self.m_da() * self.state.specific_volume()
    }

    /// Enthalpy flow `m·h` relative to the property model's reference state.
    pub fn enthalpy_flow(&self) -> Power {
        Power::new::<watt>(self.m() * self.state.h())
    }

    /// Water vapour mass flow `m·W`.
    pub fn water_flow(&self) -> MassRate {
        MassRate::new::<kilogram_per_second>(self.m() * self.state.w())
    }

    /// Returns a stream with the same flow carrying another state.
    #[must_use]
    pub fn with_state(&self, state: MoistAirState) -> Self {
        Self {
            state,
            m_da: self.m_da,
        }
    }

    pub(crate) fn m(&self) -> f64 {
        self.m_da().get::<kilogram_per_second>()
    }
}
