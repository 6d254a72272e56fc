use std::{cmp::Ordering, ops::Add};

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError};

/// Marker for values that are zero or greater.
///
/// Dry-air mass flows use this constraint: a branch may legitimately carry
/// no air, but never a negative amount.
///
/// ```
/// use airco_models::support::constraint::NonNegative;
/// use uom::si::{f64::MassRate, mass_rate::kilogram_per_second};
///
/// assert!(NonNegative::new(MassRate::new::<kilogram_per_second>(0.0)).is_ok());
/// assert!(NonNegative::new(MassRate::new::<kilogram_per_second>(-0.1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs a [`Constrained<T, NonNegative>`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or `NaN`.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::new(value)
    }

    /// Returns zero as a non-negative value.
    #[must_use]
    pub fn zero<T: PartialOrd + Zero>() -> Constrained<T, NonNegative> {
        Constrained::wrap(T::zero())
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

/// Sum of two non-negative values, which is again non-negative.
impl<T> Add for Constrained<T, NonNegative>
where
    T: Add<Output = T> + PartialOrd + Zero,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let value = self.into_inner() + rhs.into_inner();
        debug_assert!(value >= T::zero(), "sum of non-negative values went negative");
        Self::wrap(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{f64::MassRate, mass_rate::kilogram_per_second};

    #[test]
    fn accepts_zero_and_positive_flows() {
        let none = NonNegative::new(MassRate::new::<kilogram_per_second>(0.0)).unwrap();
        let some = NonNegative::new(MassRate::new::<kilogram_per_second>(1.5)).unwrap();

        let total = none + some;
        assert_eq!(total.into_inner().get::<kilogram_per_second>(), 1.5);
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert_eq!(
            NonNegative::new(-1e-12).unwrap_err(),
            ConstraintError::Negative
        );
        assert_eq!(
            NonNegative::new(f64::NAN).unwrap_err(),
            ConstraintError::NotANumber
        );
    }
}
