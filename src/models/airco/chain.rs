//! Ordered composition of process steps.
//!
//! A [`ProcessChain`] threads a main airstream through its steps in order,
//! so the outlet of one step is the inlet of the next. Evaluation is
//! deterministic and order-dependent: cooling then humidifying is not the
//! same as humidifying then cooling.
//!
//! Flow changes only at explicit branch points. [`ChainStep::Split`]
//! diverts part of the main stream into a named branch (exhaust, relief,
//! a bypass); [`ChainStep::Merge`] mixes that branch back in adiabatically.
//! Branches that are never merged leave the chain and are reported in
//! [`ChainResults::exhausted`].

mod model;

pub use model::ChainModel;

use std::collections::BTreeMap;

use uom::{
    ConstZero,
    si::f64::{MassRate, Power},
};

use crate::support::{
    constraint::{Constrained, NonNegative},
    psychro::PsychroModel,
};

use super::{
    AirContext, AirStream, ChainError, Loads, Process, ProcessError,
    process::{AdiabaticMixing, Apparatus},
};

/// One step of a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainStep {
    /// Apply a process to the main stream.
    Process(Process),

    /// Divert `m_da` of the main stream into a named branch.
    Split {
        branch: String,
        m_da: Constrained<MassRate, NonNegative>,
    },

    /// Mix a named branch back into the main stream.
    Merge { branch: String },
}

impl ChainStep {
    /// Short name used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Process(process) => process.name(),
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
        }
    }
}

/// An ordered sequence of steps applied to an airstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessChain {
    steps: Vec<ChainStep>,
}

/// What happened at one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    /// Zero-based step index.
    pub index: usize,

    /// Step name.
    pub name: &'static str,

    /// Main stream entering the step.
    pub inlet: AirStream,

    /// Main stream leaving the step.
    pub outlet: AirStream,

    /// Heat and water added to the main stream.
    pub loads: Loads,

    /// Coil apparatus data, for cooling coils.
    pub apparatus: Option<Apparatus>,
}

/// The result of evaluating a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResults {
    /// One record per step, in order.
    pub records: Vec<StepRecord>,

    /// Main stream leaving the last step.
    pub outlet: AirStream,

    /// Branches split off and never merged back.
    pub exhausted: Vec<(String, AirStream)>,
}

impl ProcessChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a process step.
    #[must_use]
    pub fn then(mut self, process: impl Into<Process>) -> Self {
        self.steps.push(ChainStep::Process(process.into()));
        self
    }

    /// Appends a split into a named branch.
    #[must_use]
    pub fn split(
        mut self,
        branch: impl Into<String>,
        m_da: Constrained<MassRate, NonNegative>,
    ) -> Self {
        self.steps.push(ChainStep::Split {
            branch: branch.into(),
            m_da,
        });
        self
    }

    /// Appends a merge of a named branch.
    #[must_use]
    pub fn merge(mut self, branch: impl Into<String>) -> Self {
        self.steps.push(ChainStep::Merge {
            branch: branch.into(),
        });
        self
    }

    /// Appends an arbitrary step.
    pub fn push(&mut self, step: ChainStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Evaluates the chain for an inlet stream.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`] naming the failing step. Evaluation stops at
    /// the first failure.
    pub fn evaluate<M: PsychroModel>(
        &self,
        ctx: &AirContext<M>,
        inlet: &AirStream,
    ) -> Result<ChainResults, ChainError> {
        let mut main = *inlet;
        let mut branches: BTreeMap<String, AirStream> = BTreeMap::new();
        let mut records = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            let fail = |source: ProcessError| ChainError::Step {
                index,
                name,
                source,
            };

            let (outlet, loads, apparatus) = match step {
                ChainStep::Process(process) => {
                    let outcome = process.evaluate(ctx, &main).map_err(fail)?;
                    (outcome.outlet, outcome.loads, outcome.apparatus)
                }

                ChainStep::Split { branch, m_da } => {
                    if branches.contains_key(branch) {
                        return Err(ChainError::DuplicateBranch {
                            index,
                            branch: branch.clone(),
                        });
                    }
                    let requested = *m_da.as_ref();
                    let available = main.m_da();
                    if requested > available {
                        return Err(ChainError::SplitExceedsFlow {
                            index,
                            branch: branch.clone(),
                            requested,
                            available,
                        });
                    }
                    let remaining = AirStream::new(main.state, available - requested)
                        .map_err(|source| {
                            fail(ProcessError::Constraint {
                                what: "remaining main flow",
                                source,
                            })
                        })?;
                    branches.insert(branch.clone(), AirStream::from_constrained(main.state, *m_da));
                    (remaining, Loads::ZERO, None)
                }

                ChainStep::Merge { branch } => {
                    let other =
                        branches
                            .remove(branch)
                            .ok_or_else(|| ChainError::UnknownBranch {
                                index,
                                branch: branch.clone(),
                            })?;
                    let outcome = AdiabaticMixing::mix(ctx, &main, &other).map_err(fail)?;
                    (outcome.outlet, Loads::ZERO, None)
                }
            };

            tracing::debug!(
                index,
                step = name,
                t_out = outlet.state.t(),
                w_out = outlet.state.w(),
                m_da = outlet.m(),
                "chain step"
            );

            records.push(StepRecord {
                index,
                name,
                inlet: main,
                outlet,
                loads,
                apparatus,
            });
            main = outlet;
        }

        Ok(ChainResults {
            records,
            outlet: main,
            exhausted: branches.into_iter().collect(),
        })
    }
}

impl ChainResults {
    /// Sum of all step loads.
    #[must_use]
    pub fn loads(&self) -> Loads {
        self.records.iter().map(|r| r.loads).sum()
    }

    /// Sum of positive step heat (heaters, fans, steam).
    #[must_use]
    pub fn heat_added(&self) -> Power {
        self.records
            .iter()
            .map(|r| r.loads.total)
            .filter(|q| *q > Power::ZERO)
            .fold(Power::ZERO, |acc, q| acc + q)
    }

    /// Sum of heat removed by cooling steps, as a positive value.
    #[must_use]
    pub fn heat_removed(&self) -> Power {
        self.records
            .iter()
            .map(|r| r.loads.total)
            .filter(|q| *q < Power::ZERO)
            .fold(Power::ZERO, |acc, q| acc - q)
    }

    /// Net water added to the main stream.
    #[must_use]
    pub fn water_added(&self) -> MassRate {
        self.loads().water
    }

    /// The record of the first step with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{Ratio, ThermodynamicTemperature},
        mass_rate::kilogram_per_second,
        power::watt,
        ratio::percent,
        thermodynamic_temperature::degree_celsius,
    };

    use crate::{
        models::airco::process::{CoolingCoil, Humidifier, Sensible},
        support::{
            constraint::UnitInterval,
            psychro::{StateInput, model::Ashrae, water},
        },
    };

    fn t(c: f64) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<degree_celsius>(c)
    }

    fn kg_s(m: f64) -> MassRate {
        MassRate::new::<kilogram_per_second>(m)
    }

    fn stream(ctx: &AirContext<Ashrae>, dry_bulb: f64, rh: f64, m: f64) -> AirStream {
        let state = ctx
            .state(StateInput::DryBulbRelativeHumidity {
                dry_bulb: t(dry_bulb),
                relative_humidity: Ratio::new::<percent>(rh),
            })
            .unwrap();
        AirStream::new(state, kg_s(m)).unwrap()
    }

    #[test]
    fn air_handler_path() -> Result<(), ChainError> {
        let ctx = AirContext::standard(Ashrae);
        let ret = stream(&ctx, 24.0, 50.0, 4.0);
        let outdoor = stream(&ctx, 35.0, 40.0, 1.0);

        let chain = ProcessChain::new()
            .split("exhaust", NonNegative::new(kg_s(1.0)).unwrap())
            .then(AdiabaticMixing::with(outdoor))
            .then(CoolingCoil::Bypass {
                apparatus_dew_point: t(10.0),
                bypass_factor: UnitInterval::new(0.1).unwrap(),
            })
            .then(Sensible::ToDryBulb(t(14.0)));

        let results = chain.evaluate(&ctx, &ret)?;

        assert_eq!(results.records.len(), 4);
        assert_relative_eq!(results.outlet.m(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(results.outlet.state.t(), 14.0, epsilon = 1e-12);

        let (name, exhaust) = &results.exhausted[0];
        assert_eq!(name, "exhaust");
        assert_eq!(exhaust.state, ret.state);

        let coil = results.find("cooling coil").unwrap();
        assert!(coil.apparatus.is_some());
        assert!(results.heat_removed().get::<watt>() > 0.0);
        assert!(results.heat_added().get::<watt>() > 0.0);
        assert!(results.water_added().get::<kilogram_per_second>() < 0.0);
        Ok(())
    }

    #[test]
    fn split_and_merge_restore_flow() -> Result<(), ChainError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = stream(&ctx, 30.0, 50.0, 2.0);

        let chain = ProcessChain::new()
            .split("bypass", NonNegative::new(kg_s(0.5)).unwrap())
            .then(CoolingCoil::Bypass {
                apparatus_dew_point: t(8.0),
                bypass_factor: UnitInterval::new(0.0).unwrap(),
            })
            .merge("bypass");

        let results = chain.evaluate(&ctx, &inlet)?;

        assert_relative_eq!(results.outlet.m(), 2.0, epsilon = 1e-12);
        assert!(results.exhausted.is_empty());
        let w = 0.75 * results.records[1].outlet.state.w() + 0.25 * inlet.state.w();
        assert_relative_eq!(results.outlet.state.w(), w, epsilon = 1e-15);
        Ok(())
    }

    #[test]
    fn order_matters() -> Result<(), ChainError> {
        let ctx = AirContext::standard(Ashrae);
        let inlet = stream(&ctx, 28.0, 50.0, 1.0);

        let cool = CoolingCoil::Outlet {
            dry_bulb: t(16.0),
            humidity_ratio: Ratio::new::<uom::si::ratio::ratio>(0.008),
        };
        let humidify = Humidifier::Injection {
            water: NonNegative::new(kg_s(0.001)).unwrap(),
            enthalpy: water::vapor_enthalpy(t(100.0)),
        };

        let a = ProcessChain::new().then(cool).then(humidify).evaluate(&ctx, &inlet)?;
        let b = ProcessChain::new().then(humidify).then(cool).evaluate(&ctx, &inlet)?;

        assert!(!a.outlet.state.approx_eq(&b.outlet.state, &ctx.config.tolerance));
        Ok(())
    }

    #[test]
    fn errors_name_the_step() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = stream(&ctx, 26.0, 60.0, 1.0);

        let chain = ProcessChain::new()
            .then(Sensible::ToDryBulb(t(30.0)))
            .then(Sensible::ToDryBulb(t(5.0)));

        match chain.evaluate(&ctx, &inlet) {
            Err(ChainError::Step { index, name, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "sensible");
            }
            other => panic!("expected step error, got {other:?}"),
        }
    }

    #[test]
    fn branch_bookkeeping_errors() {
        let ctx = AirContext::standard(Ashrae);
        let inlet = stream(&ctx, 26.0, 60.0, 1.0);

        let unknown = ProcessChain::new().merge("relief").evaluate(&ctx, &inlet);
        assert!(matches!(unknown, Err(ChainError::UnknownBranch { index: 0, .. })));

        let too_much = ProcessChain::new()
            .split("relief", NonNegative::new(kg_s(2.0)).unwrap())
            .evaluate(&ctx, &inlet);
        assert!(matches!(too_much, Err(ChainError::SplitExceedsFlow { .. })));

        let twice = ProcessChain::new()
            .split("relief", NonNegative::new(kg_s(0.1)).unwrap())
            .split("relief", NonNegative::new(kg_s(0.1)).unwrap())
            .evaluate(&ctx, &inlet);
        assert!(matches!(twice, Err(ChainError::DuplicateBranch { index: 1, .. })));
    }
}
