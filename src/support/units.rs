//! Extensions to [`uom`].
//!
//! This crate uses [`uom`] for every physical quantity that crosses a public
//! API. This module adds the few pieces the air-conditioning models need
//! that [`uom`] does not ship:
//!
//! - Quantity aliases for per-unit-mass-of-dry-air properties
//!   ([`SpecificEnthalpy`], [`SpecificVolume`]).
//! - [`TemperatureDifference::minus`], which subtracts two absolute
//!   temperatures and yields a [`TemperatureInterval`].
//! - [`TemperatureOffset`], which moves an absolute temperature by an
//!   interval.
//!
//! ```
//! use airco_models::support::units::{TemperatureDifference, TemperatureOffset};
//! use uom::si::{
//!     f64::{TemperatureInterval, ThermodynamicTemperature},
//!     temperature_interval::kelvin as delta_kelvin,
//!     thermodynamic_temperature::degree_celsius,
//! };
//!
//! let zone = ThermodynamicTemperature::new::<degree_celsius>(24.0);
//! let supply = zone.less(TemperatureInterval::new::<delta_kelvin>(11.0));
//!
//! assert!((supply.get::<degree_celsius>() - 13.0).abs() < 1e-12);
//! assert!((zone.minus(supply).get::<delta_kelvin>() - 11.0).abs() < 1e-12);
//! ```
//!
//! [`TemperatureInterval`]: uom::si::f64::TemperatureInterval

mod quantities;
mod temperature_difference;

pub use quantities::{SpecificEnthalpy, SpecificVolume, specific_volume};
pub use temperature_difference::{TemperatureDifference, TemperatureOffset};
