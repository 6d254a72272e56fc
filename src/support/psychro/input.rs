use uom::si::f64::{Ratio, ThermodynamicTemperature};

use crate::support::units::SpecificEnthalpy;

use super::PropertyError;

/// The known half of a moist-air state.
///
/// Each variant names one supported pair of independent intensive
/// properties. Together with a barometric pressure, a variant fixes the
/// state completely.
///
/// Humidity ratios are kg of water vapour per kg of dry air, enthalpies are
/// per kg of dry air, and relative humidity is a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    DryBulbWetBulb {
        dry_bulb: ThermodynamicTemperature,
        wet_bulb: ThermodynamicTemperature,
    },
    DryBulbRelativeHumidity {
        dry_bulb: ThermodynamicTemperature,
        relative_humidity: Ratio,
    },
    DryBulbHumidityRatio {
        dry_bulb: ThermodynamicTemperature,
        humidity_ratio: Ratio,
    },
    DryBulbDewPoint {
        dry_bulb: ThermodynamicTemperature,
        dew_point: ThermodynamicTemperature,
    },
    DryBulbEnthalpy {
        dry_bulb: ThermodynamicTemperature,
        enthalpy: SpecificEnthalpy,
    },
    EnthalpyHumidityRatio {
        enthalpy: SpecificEnthalpy,
        humidity_ratio: Ratio,
    },
    HumidityRatioRelativeHumidity {
        humidity_ratio: Ratio,
        relative_humidity: Ratio,
    },
    WetBulbRelativeHumidity {
        wet_bulb: ThermodynamicTemperature,
        relative_humidity: Ratio,
    },
    WetBulbHumidityRatio {
        wet_bulb: ThermodynamicTemperature,
        humidity_ratio: Ratio,
    },
    RelativeHumidityEnthalpy {
        relative_humidity: Ratio,
        enthalpy: SpecificEnthalpy,
    },
}

/// Identifies a moist-air property without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    DryBulb,
    WetBulb,
    DewPoint,
    HumidityRatio,
    RelativeHumidity,
    Enthalpy,
}

/// A single known moist-air property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property {
    DryBulb(ThermodynamicTemperature),
    WetBulb(ThermodynamicTemperature),
    DewPoint(ThermodynamicTemperature),
    HumidityRatio(Ratio),
    RelativeHumidity(Ratio),
    Enthalpy(SpecificEnthalpy),
}

impl Property {
    /// Returns the kind of this property.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::DryBulb(_) => PropertyKind::DryBulb,
            Self::WetBulb(_) => PropertyKind::WetBulb,
            Self::DewPoint(_) => PropertyKind::DewPoint,
            Self::HumidityRatio(_) => PropertyKind::HumidityRatio,
            Self::RelativeHumidity(_) => PropertyKind::RelativeHumidity,
            Self::Enthalpy(_) => PropertyKind::Enthalpy,
        }
    }
}

impl TryFrom<(Property, Property)> for StateInput {
    type Error = PropertyError;

    /// Converts an unordered pair of properties into a [`StateInput`].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NotIndependent`] when both properties are the
    /// same kind or are humidity ratio and dew point, which carry the same
    /// information. Returns [`PropertyError::Unsupported`] for independent
    /// pairs without a variant.
    fn try_from((a, b): (Property, Property)) -> Result<Self, Self::Error> {
        use Property as P;

        let input = match (a, b) {
            (P::DryBulb(dry_bulb), P::WetBulb(wet_bulb))
            | (P::WetBulb(wet_bulb), P::DryBulb(dry_bulb)) => {
                Self::DryBulbWetBulb { dry_bulb, wet_bulb }
            }
            (P::DryBulb(dry_bulb), P::RelativeHumidity(relative_humidity))
            | (P::RelativeHumidity(relative_humidity), P::DryBulb(dry_bulb)) => {
                Self::DryBulbRelativeHumidity {
                    dry_bulb,
                    relative_humidity,
                }
            }
            (P::DryBulb(dry_bulb), P::HumidityRatio(humidity_ratio))
            | (P::HumidityRatio(humidity_ratio), P::DryBulb(dry_bulb)) => {
                Self::DryBulbHumidityRatio {
                    dry_bulb,
                    humidity_ratio,
                }
            }
            (P::DryBulb(dry_bulb), P::DewPoint(dew_point))
            | (P::DewPoint(dew_point), P::DryBulb(dry_bulb)) => {
                Self::DryBulbDewPoint {
                    dry_bulb,
                    dew_point,
                }
            }
            (P::DryBulb(dry_bulb), P::Enthalpy(enthalpy))
            | (P::Enthalpy(enthalpy), P::DryBulb(dry_bulb)) => {
                Self::DryBulbEnthalpy { dry_bulb, enthalpy }
            }
            (P::Enthalpy(enthalpy), P::HumidityRatio(humidity_ratio))
            | (P::HumidityRatio(humidity_ratio), P::Enthalpy(enthalpy)) => {
                Self::EnthalpyHumidityRatio {
                    enthalpy,
                    humidity_ratio,
                }
            }
            (P::HumidityRatio(humidity_ratio), P::RelativeHumidity(relative_humidity))
            | (P::RelativeHumidity(relative_humidity), P::HumidityRatio(humidity_ratio)) => {
                Self::HumidityRatioRelativeHumidity {
                    humidity_ratio,
                    relative_humidity,
                }
            }
            (P::WetBulb(wet_bulb), P::RelativeHumidity(relative_humidity))
            | (P::RelativeHumidity(relative_humidity), P::WetBulb(wet_bulb)) => {
                Self::WetBulbRelativeHumidity {
                    wet_bulb,
                    relative_humidity,
                }
            }
            (P::WetBulb(wet_bulb), P::HumidityRatio(humidity_ratio))
            | (P::HumidityRatio(humidity_ratio), P::WetBulb(wet_bulb)) => {
                Self::WetBulbHumidityRatio {
                    wet_bulb,
                    humidity_ratio,
                }
            }
            (P::RelativeHumidity(relative_humidity), P::Enthalpy(enthalpy))
            | (P::Enthalpy(enthalpy), P::RelativeHumidity(relative_humidity)) => {
                Self::RelativeHumidityEnthalpy {
                    relative_humidity,
                    enthalpy,
                }
            }
            _ => {
                let (first, second) = (a.kind(), b.kind());
                let dependent = first == second
                    || matches!(
                        (first, second),
                        (PropertyKind::HumidityRatio, PropertyKind::DewPoint)
                            | (PropertyKind::DewPoint, PropertyKind::HumidityRatio)
                    );
                return Err(if dependent {
                    PropertyError::NotIndependent { first, second }
                } else {
                    PropertyError::Unsupported { first, second }
                });
            }
        };

        Ok(input)
    }
}
