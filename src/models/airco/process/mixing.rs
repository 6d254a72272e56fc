use uom::{
    ConstZero,
    si::{
        available_energy::joule_per_kilogram,
        f64::{Power, Ratio},
        ratio::ratio,
    },
};

use crate::{
    models::airco::{AirContext, AirStream, ProcessError},
    support::{
        psychro::{PsychroModel, StateInput},
        units::SpecificEnthalpy,
    },
};

use super::{Loads, ProcessOutcome, check_balance, outlet_state};

pub(super) const NAME: &str = "mixing";

/// Adiabatic mixing of the main stream with a second stream.
///
/// The outlet humidity ratio and enthalpy are the dry-air-flow-weighted
/// averages of the inputs; the dry-bulb is back-solved by the property
/// model. No heat or water is exchanged with the surroundings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdiabaticMixing {
    /// The stream mixed into the main stream.
    pub other: AirStream,
}

impl AdiabaticMixing {
    /// Creates a mixing step that adds `other` to the main stream.
    pub fn with(other: AirStream) -> Self {
        Self { other }
    }

    pub(super) fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        Self::mix(ctx, inlet, &self.other)
    }

    /// Mixes two streams.
    ///
    /// If one stream carries no air the other state passes through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Infeasible`] if both flows are zero or the
    /// mixture would be supersaturated (fog).
    pub fn mix<M: PsychroModel>(
        ctx: &AirContext<M>,
        a: &AirStream,
        b: &AirStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        Self::mix_all(ctx, [a, b])
    }

    /// Mixes any number of streams.
    ///
    /// Weighted averaging is associative, so the result equals mixing the
    /// streams pairwise in any grouping.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Infeasible`] if there is no air to mix or the
    /// mixture would be supersaturated.
    pub fn mix_all<'a, M: PsychroModel>(
        ctx: &AirContext<M>,
        streams: impl IntoIterator<Item = &'a AirStream>,
    ) -> Result<ProcessOutcome, ProcessError> {
        let flowing: Vec<&AirStream> = streams.into_iter().filter(|s| s.m() > 0.0).collect();

        let m_out: f64 = flowing.iter().map(|s| s.m()).sum();
        let outlet_flow = flowing
            .iter()
            .map(|s| s.m_da_constrained())
            .reduce(|a, b| a + b)
            .ok_or_else(|| ProcessError::infeasible(NAME, "no air to mix"))?;

        if let [only] = flowing.as_slice() {
            return Ok(ProcessOutcome {
                outlet: AirStream::from_constrained(only.state, outlet_flow),
                loads: Loads::ZERO,
                apparatus: None,
            });
        }

        let w = flowing.iter().map(|s| s.m() * s.state.w()).sum::<f64>() / m_out;
        let h = flowing.iter().map(|s| s.m() * s.state.h()).sum::<f64>() / m_out;

        let state = outlet_state(
            ctx,
            NAME,
            StateInput::EnthalpyHumidityRatio {
                enthalpy: SpecificEnthalpy::new::<joule_per_kilogram>(h),
                humidity_ratio: Ratio::new::<ratio>(w),
            },
        )?;
        let outlet = AirStream::from_constrained(state, outlet_flow);

        let inflow = flowing
            .iter()
            .fold(Power::ZERO, |acc, s| acc + s.enthalpy_flow());
        check_balance(
            ctx,
            NAME,
            inflow,
            Power::ZERO,
            Power::ZERO,
            outlet.enthalpy_flow(),
        )?;

        tracing::trace!(streams = flowing.len(), m_da = m_out, "mixed streams");

        Ok(ProcessOutcome {
            outlet,
            loads: Loads::ZERO,
            apparatus: None,
        })
    }
}
