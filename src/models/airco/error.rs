use thiserror::Error;
use uom::si::f64::{MassRate, Power};

use crate::support::{
    constraint::ConstraintError,
    psychro::{PropertyError, StateInput},
    root::ConvergenceError,
};

/// A moist-air state could not be constructed from its inputs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid moist-air state from {input:?}")]
pub struct InvalidStateError {
    /// The inputs that were rejected.
    pub input: StateInput,

    /// Why the property model rejected them.
    #[source]
    pub source: PropertyError,
}

/// Errors that can occur while evaluating a process step.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// An intermediate or outlet state could not be resolved.
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// The requested transformation is physically infeasible.
    #[error("{process} is infeasible: {reason}")]
    Infeasible {
        /// Name of the process kind.
        process: &'static str,

        /// What made it infeasible.
        reason: String,
    },

    /// An iterative mode failed to converge.
    #[error("{process} did not converge")]
    Convergence {
        /// Name of the process kind.
        process: &'static str,

        /// Underlying solver failure.
        #[source]
        source: ConvergenceError,
    },

    /// Inlet and outlet enthalpy flows do not balance.
    #[error("{process} energy balance residual {residual:?}")]
    Imbalance {
        /// Name of the process kind.
        process: &'static str,

        /// `outflow - inflow - heat - water enthalpy`.
        residual: Power,
    },

    /// A flow or parameter violated its constraint.
    #[error("{what}: {source}")]
    Constraint {
        /// The constrained quantity.
        what: &'static str,

        /// The violated constraint.
        #[source]
        source: ConstraintError,
    },
}

impl ProcessError {
    pub(crate) fn infeasible(process: &'static str, reason: impl Into<String>) -> Self {
        Self::Infeasible {
            process,
            reason: reason.into(),
        }
    }
}

/// Errors that abort a process chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A step failed.
    #[error("step {index} ({name}) failed")]
    Step {
        /// Zero-based index of the step.
        index: usize,

        /// Process name of the step.
        name: &'static str,

        /// Underlying process failure.
        #[source]
        source: ProcessError,
    },

    /// A merge names a branch that was never split off.
    #[error("step {index} merges unknown branch {branch:?}")]
    UnknownBranch { index: usize, branch: String },

    /// A split reuses the name of a branch still open.
    #[error("step {index} splits branch {branch:?} which is already open")]
    DuplicateBranch { index: usize, branch: String },

    /// A split diverts more air than the main stream carries.
    #[error("step {index} splits {requested:?} into {branch:?} but only {available:?} is available")]
    SplitExceedsFlow {
        index: usize,
        branch: String,
        requested: MassRate,
        available: MassRate,
    },
}

/// Errors that abort a zone balance.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// A supply or zone state could not be resolved.
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// A terminal process (reheat) failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The requested supply cannot meet the zone loads.
    #[error("zone {zone:?}: {reason}")]
    Infeasible { zone: String, reason: String },

    /// The requested supply needs a zone humidity setpoint.
    #[error("zone {zone:?} has no humidity setpoint to size the supply humidity")]
    MissingHumidity { zone: String },
}

/// Errors that abort a sizing run.
#[derive(Debug, Error)]
pub enum SizingError {
    /// There are no zones to size.
    #[error("no zones to size")]
    NoZones,

    /// A part-load point names a zone absent from the design.
    #[error("zone {zone:?} is not part of the design")]
    UnknownZone { zone: String },

    /// A zone balance failed.
    #[error("zone {zone:?} failed")]
    Zone {
        zone: String,
        #[source]
        source: ZoneError,
    },

    /// The air-handler process chain failed.
    #[error("air handler evaluation failed")]
    Chain(#[from] ChainError),

    /// A standalone process failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A design state could not be resolved.
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// The design parameters cannot be met.
    #[error("infeasible design: {reason}")]
    Infeasible { reason: String },
}

impl SizingError {
    pub(crate) fn zone(zone: &str) -> impl FnOnce(ZoneError) -> Self + '_ {
        move |source| Self::Zone {
            zone: zone.to_owned(),
            source,
        }
    }
}
