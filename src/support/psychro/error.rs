use thiserror::Error;

use super::PropertyKind;

/// Errors that can occur when evaluating moist-air properties.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PropertyError {
    /// The inputs are physically inconsistent.
    ///
    /// Examples include a wet-bulb above the dry-bulb, a negative humidity
    /// ratio, or a humidity ratio above saturation.
    #[error("invalid state: {context}")]
    InvalidState { context: String },

    /// An input or derived value lies outside the valid range of the model.
    #[error("out of domain: {context}")]
    OutOfDomain { context: String },

    /// The two properties do not independently fix a state.
    #[error("{first:?} and {second:?} are not independent")]
    NotIndependent {
        first: PropertyKind,
        second: PropertyKind,
    },

    /// The pair is independent but not a supported input combination.
    #[error("{first:?} with {second:?} is not a supported input pair")]
    Unsupported {
        first: PropertyKind,
        second: PropertyKind,
    },

    /// A numerical inversion failed.
    #[error("calculation failed: {context}")]
    Calculation { context: String },
}

impl PropertyError {
    pub(crate) fn invalid(context: impl Into<String>) -> Self {
        Self::InvalidState {
            context: context.into(),
        }
    }

    pub(crate) fn out_of_domain(context: impl Into<String>) -> Self {
        Self::OutOfDomain {
            context: context.into(),
        }
    }
}
