//! Enthalpy of water injected into an airstream.
//!
//! Both functions use the same reference state as [`Ashrae`](super::model::Ashrae)
//! (liquid water and dry air at 0 °C), so a humidifier energy balance closes
//! against moist-air enthalpies from that model.

use uom::si::{
    available_energy::joule_per_kilogram, f64::ThermodynamicTemperature,
    thermodynamic_temperature::degree_celsius,
};

use crate::support::units::SpecificEnthalpy;

/// Specific heat of liquid water, J/kg·K.
pub(crate) const CP_LIQUID: f64 = 4186.0;

/// Specific heat of water vapour, J/kg·K.
pub(crate) const CP_VAPOR: f64 = 1860.0;

/// Latent heat of vaporisation at 0 °C, J/kg.
pub(crate) const H_FG_0C: f64 = 2_501_000.0;

/// Enthalpy of liquid water at `t` (spray humidifiers, air washers).
#[must_use]
pub fn liquid_enthalpy(t: ThermodynamicTemperature) -> SpecificEnthalpy {
    SpecificEnthalpy::new::<joule_per_kilogram>(CP_LIQUID * t.get::<degree_celsius>())
}

/// Enthalpy of water vapour at `t` (steam humidifiers).
///
/// The ideal-gas vapour enthalpy is independent of pressure, so this also
/// serves for saturated steam at its saturation temperature.
#[must_use]
pub fn vapor_enthalpy(t: ThermodynamicTemperature) -> SpecificEnthalpy {
    SpecificEnthalpy::new::<joule_per_kilogram>(H_FG_0C + CP_VAPOR * t.get::<degree_celsius>())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::available_energy::kilojoule_per_kilogram;

    #[test]
    fn steam_at_100_c() {
        let t = ThermodynamicTemperature::new::<degree_celsius>(100.0);
        assert_relative_eq!(vapor_enthalpy(t).get::<kilojoule_per_kilogram>(), 2687.0);
        assert_relative_eq!(liquid_enthalpy(t).get::<kilojoule_per_kilogram>(), 418.6);
    }
}
