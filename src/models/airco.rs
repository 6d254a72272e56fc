//! Moist-air processes and CAV/VAV system sizing.
//!
//! Everything here is evaluated through an [`AirContext`], which pairs a
//! [`PsychroModel`](crate::support::psychro::PsychroModel) with an
//! [`AircoConfig`] (barometric pressure, specific heat, latent heat,
//! tolerances, solver bounds). Nothing reads ambient global state, so an
//! altitude scenario is just a different context.
//!
//! # Building blocks
//!
//! - [`MoistAirState`]: an immutable, fully resolved state.
//! - [`AirStream`]: a state with a dry-air mass flow.
//! - [`process`]: the closed set of process steps ([`Process`]).
//! - [`chain`]: ordered composition of steps with branch splits and merges.
//! - [`zone`]: zone load balances and terminal reheat.
//! - [`system`]: multi-zone design and part-load sizing.
//! - [`scenario`]: declarative JSON configuration.
//!
//! # Sign convention
//!
//! Process [`Loads`] are heat and water *added to the airstream*. A cooling
//! coil reports negative total, sensible and latent loads and a negative
//! water term (condensate). Zone loads are heat gains *to the zone*, so a
//! positive sensible zone load needs supply air colder than the zone.

pub mod chain;
mod config;
mod error;
pub mod process;
pub mod scenario;
mod state;
pub mod system;
mod warning;
pub mod zone;

pub use chain::{ChainResults, ProcessChain};
pub use config::{AirContext, AircoConfig, Tolerances};
pub use error::{ChainError, InvalidStateError, ProcessError, SizingError, ZoneError};
pub use process::{Loads, Process, ProcessOutcome};
pub use state::{AirStream, MoistAirState};
pub use warning::SizingWarning;
pub use zone::{ZoneBalance, ZoneLoads, ZoneSetpoint};

pub use crate::support::root::{ConvergenceError, SolverConfig};
