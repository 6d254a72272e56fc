use uom::si::f64::{Pressure, Ratio, ThermodynamicTemperature};

use crate::support::units::{SpecificEnthalpy, SpecificVolume};

use super::{Property, PropertyKind};

/// The complete set of moist-air properties at one state.
///
/// Enthalpy and specific volume are per kg of dry air.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Properties {
    pub dry_bulb: ThermodynamicTemperature,
    pub wet_bulb: ThermodynamicTemperature,
    /// Dew point, or `None` for perfectly dry air.
    pub dew_point: Option<ThermodynamicTemperature>,
    pub humidity_ratio: Ratio,
    pub relative_humidity: Ratio,
    pub enthalpy: SpecificEnthalpy,
    pub specific_volume: SpecificVolume,
    pub pressure: Pressure,
}

impl Properties {
    /// Returns the property of the given kind, if defined.
    #[must_use]
    pub fn get(&self, kind: PropertyKind) -> Option<Property> {
        Some(match kind {
            PropertyKind::DryBulb => Property::DryBulb(self.dry_bulb),
            PropertyKind::WetBulb => Property::WetBulb(self.wet_bulb),
            PropertyKind::DewPoint => Property::DewPoint(self.dew_point?),
            PropertyKind::HumidityRatio => Property::HumidityRatio(self.humidity_ratio),
            PropertyKind::RelativeHumidity => Property::RelativeHumidity(self.relative_humidity),
            PropertyKind::Enthalpy => Property::Enthalpy(self.enthalpy),
        })
    }
}
