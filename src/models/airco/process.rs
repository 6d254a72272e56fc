//! Air-conditioning process steps.
//!
//! [`Process`] is the closed set of physical transformations an airstream
//! can undergo. Every variant honours the same contract:
//!
//! - dry-air mass is conserved (mixing outputs the sum of its inputs),
//! - the outlet is a new [`MoistAirState`] resolved through the property
//!   model, and
//! - the [`Loads`] report heat and water added to the airstream.
//!
//! Steps that add heat or water from a known source verify the energy
//! balance `Σ m·h_in + Q + m_w·h_w = m·h_out` before returning.

mod coil;
mod fan;
mod humidifier;
mod loads;
mod mixing;
mod sensible;

pub use coil::{Apparatus, CoolingCoil};
pub use fan::Fan;
pub use humidifier::Humidifier;
pub use loads::Loads;
pub use mixing::AdiabaticMixing;
pub use sensible::Sensible;

use uom::si::{
    f64::{Power, Ratio, ThermodynamicTemperature},
    power::watt,
    ratio::ratio,
};

use crate::support::psychro::{PropertyError, PsychroModel, StateInput};

use super::{AirContext, AirStream, InvalidStateError, MoistAirState, ProcessError};

/// One physical process applied to an airstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Process {
    /// Adiabatic mixing with a second stream.
    Mixing(AdiabaticMixing),

    /// Sensible-only heating or cooling.
    Sensible(Sensible),

    /// Cooling with dehumidification.
    CoolingCoil(CoolingCoil),

    /// Water or steam injection.
    Humidifier(Humidifier),

    /// Fan heat.
    Fan(Fan),
}

/// The result of one process step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOutcome {
    /// Outlet stream.
    pub outlet: AirStream,

    /// Heat and water added to the airstream.
    pub loads: Loads,

    /// Coil apparatus dew point and bypass factor, when applicable.
    pub apparatus: Option<Apparatus>,
}

impl Process {
    /// Short name of the process kind, used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mixing(_) => mixing::NAME,
            Self::Sensible(_) => sensible::NAME,
            Self::CoolingCoil(_) => coil::NAME,
            Self::Humidifier(_) => humidifier::NAME,
            Self::Fan(_) => fan::NAME,
        }
    }

    /// Applies this process to `inlet`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] if the transformation is infeasible, a
    /// state cannot be resolved, an iterative mode fails to converge, or the
    /// energy balance does not close.
    pub fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        match self {
            Self::Mixing(mixing) => mixing.evaluate(ctx, inlet),
            Self::Sensible(sensible) => sensible.evaluate(ctx, inlet),
            Self::CoolingCoil(coil) => coil.evaluate(ctx, inlet),
            Self::Humidifier(humidifier) => humidifier.evaluate(ctx, inlet),
            Self::Fan(fan) => fan.evaluate(ctx, inlet),
        }
    }
}

impl From<AdiabaticMixing> for Process {
    fn from(value: AdiabaticMixing) -> Self {
        Self::Mixing(value)
    }
}

impl From<Sensible> for Process {
    fn from(value: Sensible) -> Self {
        Self::Sensible(value)
    }
}

impl From<CoolingCoil> for Process {
    fn from(value: CoolingCoil) -> Self {
        Self::CoolingCoil(value)
    }
}

impl From<Humidifier> for Process {
    fn from(value: Humidifier) -> Self {
        Self::Humidifier(value)
    }
}

impl From<Fan> for Process {
    fn from(value: Fan) -> Self {
        Self::Fan(value)
    }
}

/// Resolves an outlet state, reporting supersaturation as infeasibility.
fn outlet_state<M: PsychroModel>(
    ctx: &AirContext<M>,
    process: &'static str,
    input: StateInput,
) -> Result<MoistAirState, ProcessError> {
    ctx.state(input).map_err(|err| match err.source {
        PropertyError::InvalidState { context } => ProcessError::infeasible(process, context),
        _ => ProcessError::InvalidState(err),
    })
}

/// Resolves the saturated state at `dry_bulb`.
fn saturated<M: PsychroModel>(
    ctx: &AirContext<M>,
    dry_bulb: ThermodynamicTemperature,
) -> Result<MoistAirState, InvalidStateError> {
    ctx.state(StateInput::DryBulbRelativeHumidity {
        dry_bulb,
        relative_humidity: Ratio::new::<ratio>(1.0),
    })
}

/// Checks `Σ m·h_in + Q + m_w·h_w = m·h_out` within tolerance.
fn check_balance<M>(
    ctx: &AirContext<M>,
    process: &'static str,
    inflow: Power,
    heat: Power,
    water_enthalpy: Power,
    outflow: Power,
) -> Result<(), ProcessError> {
    let terms = [inflow, heat, water_enthalpy, outflow].map(|p| p.get::<watt>());
    let [inflow, heat, water, outflow] = terms;

    let residual = outflow - inflow - heat - water;
    let scale = terms.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
    let tol = &ctx.config.tolerance;

    if residual.abs() <= tol.energy_abs.get::<watt>() + tol.energy_rel * scale {
        Ok(())
    } else {
        Err(ProcessError::Imbalance {
            process,
            residual: Power::new::<watt>(residual),
        })
    }
}
