use twine_core::Model;

use crate::{
    models::airco::{AirContext, AirStream, ChainError},
    support::psychro::PsychroModel,
};

use super::{ChainResults, ProcessChain};

/// [`Model`] adapter evaluating a fixed chain for any inlet stream.
///
/// Lets a chain be driven by twine solvers and observers, for example to
/// search for the outdoor-air flow that hits a mixed-air temperature.
#[derive(Debug, Clone, Copy)]
pub struct ChainModel<'a, M> {
    chain: &'a ProcessChain,
    ctx: &'a AirContext<M>,
}

impl<'a, M> ChainModel<'a, M> {
    pub fn new(chain: &'a ProcessChain, ctx: &'a AirContext<M>) -> Self {
        Self { chain, ctx }
    }
}

impl<M: PsychroModel> Model for ChainModel<'_, M> {
    type Input = AirStream;
    type Output = ChainResults;
    type Error = ChainError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.chain.evaluate(self.ctx, input)
    }
}
