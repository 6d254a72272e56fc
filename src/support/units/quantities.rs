use uom::{
    si::{
        ISQ, Quantity, SI,
        f64::{Mass, Volume},
        mass::kilogram,
        volume::cubic_meter,
    },
    typenum::{N1, N2, P2, P3, Z0},
};

/// Specific enthalpy, J/kg in SI.
///
/// Moist-air enthalpy is expressed per kilogram of dry air.
pub type SpecificEnthalpy = Quantity<ISQ<P2, Z0, N2, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Specific volume, m³/kg in SI.
///
/// Moist-air specific volume is expressed per kilogram of dry air.
pub type SpecificVolume = Quantity<ISQ<P3, N1, Z0, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Creates a [`SpecificVolume`] from a value in m³/kg.
#[must_use]
pub fn specific_volume(cubic_meter_per_kilogram: f64) -> SpecificVolume {
    Volume::new::<cubic_meter>(cubic_meter_per_kilogram) / Mass::new::<kilogram>(1.0)
}
