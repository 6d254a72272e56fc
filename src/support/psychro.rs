//! Moist-air property evaluation.
//!
//! The air-conditioning models never evaluate psychrometric correlations
//! directly. They describe what is known about a state with a
//! [`StateInput`] (one variant per supported pair of independent
//! properties) and ask a [`PsychroModel`] for the complete [`Properties`]
//! set at a barometric pressure.
//!
//! [`model::Ashrae`] implements the service with the SI correlations of the
//! ASHRAE Handbook of Fundamentals. Other implementations (tabulated data, a
//! different reference state) can be swapped in behind the same trait.
//!
//! Pairs known only at runtime can be converted with
//! `StateInput::try_from((Property, Property))`, which rejects dependent
//! pairs such as humidity ratio with dew point.

mod error;
mod input;
pub mod model;
mod properties;
pub mod water;

pub use error::PropertyError;
pub use input::{Property, PropertyKind, StateInput};
pub use properties::Properties;

use uom::si::f64::Pressure;

/// A moist-air property-evaluation service.
///
/// Implementations must be deterministic and stateless. Values supplied in
/// the [`StateInput`] should be reproduced verbatim in the returned
/// [`Properties`] so that a state built from a humidity ratio carries that
/// exact humidity ratio.
pub trait PsychroModel {
    /// Resolves the complete property set for `input` at `pressure`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the inputs are inconsistent, outside the
    /// valid range of the correlations, or a numerical inversion fails.
    fn properties(&self, input: &StateInput, pressure: Pressure)
    -> Result<Properties, PropertyError>;
}

impl<M: PsychroModel + ?Sized> PsychroModel for &M {
    fn properties(
        &self,
        input: &StateInput,
        pressure: Pressure,
    ) -> Result<Properties, PropertyError> {
        (**self).properties(input, pressure)
    }
}
