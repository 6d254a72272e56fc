//! Bounded scalar root finding.
//!
//! Several psychrometric inversions (dew point, wet-bulb) and process modes
//! (coil capacity, humidifier target relative humidity) reduce to finding
//! `x` in a bracket `[a, b]` where `f(x) = 0`. This module adapts a plain
//! closure to [`twine_core::Model`] and [`twine_core::EquationProblem`] and
//! solves it with [`twine_solvers::equation::bisection`].
//!
//! Iteration is always bounded by [`SolverConfig::max_iters`]; failing to
//! converge is reported as [`ConvergenceError::MaxIters`], never as an
//! unchecked approximate result.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;

/// Solver bounds for bisection solves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum iteration count for a single solve.
    pub max_iters: usize,

    /// Absolute tolerance on the search variable.
    pub x_abs_tol: f64,

    /// Absolute tolerance on the residual.
    pub residual_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            x_abs_tol: 1e-10,
            residual_tol: 1e-12,
        }
    }
}

impl SolverConfig {
    /// Converts this configuration into a bisection solver configuration.
    fn bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.max_iters,
            x_abs_tol: self.x_abs_tol,
            x_rel_tol: 0.0,
            residual_tol: self.residual_tol,
        }
    }
}

/// Errors from a bounded root solve.
#[derive(Debug, Error)]
pub enum ConvergenceError {
    /// The residual does not change sign across the bracket.
    #[error("no sign change in bracket [{lower}, {upper}]")]
    Bracket {
        /// Lower end of the bracket.
        lower: f64,

        /// Upper end of the bracket.
        upper: f64,
    },

    /// The bisection solver encountered an error.
    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    /// The solver reached the iteration limit without converging.
    #[error("solver hit iteration limit after {iters} iterations: residual={residual}")]
    MaxIters {
        /// Best residual achieved.
        residual: f64,

        /// Iteration count performed by the solver.
        iters: usize,
    },
}

/// Finds `x` in `bracket` such that `f(x) = 0`.
///
/// A failed evaluation of `f` is treated as a positive residual, which
/// steers the search away from infeasible regions (for example a candidate
/// that would supersaturate the air). Callers orient `f` so that the
/// infeasible side is the positive side.
///
/// # Errors
///
/// Returns [`ConvergenceError::Bracket`] if `f` does not change sign across
/// the bracket, or another [`ConvergenceError`] if the solve fails.
pub fn bisect<F, E>(f: F, bracket: [f64; 2], config: &SolverConfig) -> Result<f64, ConvergenceError>
where
    F: Fn(f64) -> Result<f64, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let [lower, upper] = bracket;
    let at = |x: f64| f(x).ok().filter(|r| !r.is_nan());

    let (Some(f_lower), Some(f_upper)) = (at(lower), at(upper)) else {
        let positive = |x: f64| at(x).is_none_or(|r| r > 0.0);
        if positive(lower) == positive(upper) {
            return Err(ConvergenceError::Bracket { lower, upper });
        }
        return solve(f, bracket, config);
    };

    if f_lower == 0.0 {
        return Ok(lower);
    }
    if f_upper == 0.0 {
        return Ok(upper);
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(ConvergenceError::Bracket { lower, upper });
    }

    solve(f, bracket, config)
}

fn solve<F, E>(f: F, bracket: [f64; 2], config: &SolverConfig) -> Result<f64, ConvergenceError>
where
    F: Fn(f64) -> Result<f64, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let model = Scalar(f);

    let solution = bisection::solve(
        &model,
        &ZeroOf,
        bracket,
        &config.bisection(),
        |event: &bisection::Event<'_, _, _>| {
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )?;

    if solution.status != bisection::Status::Converged {
        return Err(ConvergenceError::MaxIters {
            residual: solution.residual,
            iters: solution.iters,
        });
    }

    Ok(solution.snapshot.output.x)
}

/// One evaluation of the scalar function.
#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    value: f64,
}

/// Model adapter exposing a closure as a single-input model.
struct Scalar<F>(F);

impl<F, E> Model for Scalar<F>
where
    F: Fn(f64) -> Result<f64, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Input = f64;
    type Output = Sample;
    type Error = E;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let value = (self.0)(*input)?;
        tracing::trace!(x = *input, value, "bisection sample");
        Ok(Sample { x: *input, value })
    }
}

/// Equation problem whose residual is the sampled value itself.
struct ZeroOf;

impl EquationProblem<1> for ZeroOf {
    type Input = f64;
    type Output = Sample;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.value])
    }
}
