//! Construction-time numeric constraints.
//!
//! Physical inputs to the air-conditioning models carry simple invariants:
//! a dry-air mass flow is never negative, a fan pressure rise is positive,
//! a bypass factor lies in `[0, 1]`, an efficiency lies in `(0, 1]`.
//! [`Constrained<T, C>`] checks such an invariant once, when the value is
//! created, so downstream code can rely on it without re-checking.
//!
//! # Provided constraints
//!
//! - [`NonNegative`]: zero or greater (mass flows, exhaust rates)
//! - [`StrictlyPositive`]: greater than zero (pressure rises, capacities)
//! - [`UnitInterval`]: `0 ≤ x ≤ 1` (bypass factors, effectiveness, diversity)
//! - [`UnitIntervalLowerOpen`]: `0 < x ≤ 1` (efficiencies)

mod non_negative;
mod strictly_positive;
mod unit_interval;

use std::marker::PhantomData;

use thiserror::Error;

pub use non_negative::NonNegative;
pub use strictly_positive::StrictlyPositive;
pub use unit_interval::{UnitBounds, UnitInterval, UnitIntervalLowerOpen};

/// A numeric invariant checked at construction time.
pub trait Constraint<T> {
    /// Checks that `value` satisfies this constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] describing the violation.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// Reason a value was rejected by a [`Constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value must not be zero")]
    Zero,
    #[error("value is not a number")]
    NotANumber,
    #[error("value is below the minimum allowed")]
    BelowMinimum,
    #[error("value is above the maximum allowed")]
    AboveMaximum,
}

/// A result type alias to use with [`Constraint`].
pub type ConstraintResult<T, E = ConstraintError> = Result<T, E>;

/// A value known to satisfy the constraint `C`.
///
/// ```
/// use airco_models::support::constraint::{Constrained, UnitInterval};
///
/// let bypass = Constrained::<f64, UnitInterval>::new(0.15).unwrap();
/// assert_eq!(bypass.into_inner(), 0.15);
/// assert!(Constrained::<f64, UnitInterval>::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Checks `value` against `C` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not satisfy the constraint.
    pub fn new(value: T) -> ConstraintResult<Self> {
        C::check(&value)?;
        Ok(Self::wrap(value))
    }

    /// Wraps a value already known to satisfy `C`.
    pub(crate) fn wrap(value: T) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, C: Constraint<T>> AsRef<T> for Constrained<T, C> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
