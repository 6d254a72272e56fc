//! # Airco Models
//!
//! Psychrometric state, air-conditioning process, and multi-zone CAV/VAV
//! sizing models.
//!
//! ## Crate layout
//!
//! - [`models`]: The air-conditioning domain: moist-air states, process
//!   steps, process chains, zone balances, and system sizing.
//! - [`support`]: Supporting utilities used by models, including the
//!   moist-air property service the models consume.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! ## Quick look
//!
//! ```
//! use airco_models::models::airco::{AirContext, AirStream, process::AdiabaticMixing};
//! use airco_models::support::psychro::{StateInput, model::Ashrae};
//! use uom::si::{
//!     f64::{MassRate, Ratio, ThermodynamicTemperature},
//!     mass_rate::kilogram_per_second,
//!     ratio::percent,
//!     thermodynamic_temperature::degree_celsius,
//! };
//!
//! let ctx = AirContext::standard(Ashrae);
//!
//! let outdoor = ctx.state(StateInput::DryBulbRelativeHumidity {
//!     dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(35.0),
//!     relative_humidity: Ratio::new::<percent>(40.0),
//! })?;
//! let ret = ctx.state(StateInput::DryBulbRelativeHumidity {
//!     dry_bulb: ThermodynamicTemperature::new::<degree_celsius>(24.0),
//!     relative_humidity: Ratio::new::<percent>(50.0),
//! })?;
//!
//! let mixed = AdiabaticMixing::mix(
//!     &ctx,
//!     &AirStream::new(outdoor, MassRate::new::<kilogram_per_second>(0.2))?,
//!     &AirStream::new(ret, MassRate::new::<kilogram_per_second>(0.8))?,
//! )?;
//!
//! let t = mixed.outlet.state.dry_bulb().get::<degree_celsius>();
//! assert!((t - 26.2).abs() < 0.1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod models;
pub mod support;
