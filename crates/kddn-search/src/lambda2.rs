// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::resample::permuted_split;
use kddn_core::{
    ConditionMatrix, ExecutionContext, KddnError, PenaltyParams, PriorKnowledge, RunPhase,
    SeedStream, SolverConfig, null_differential_rate, trial_rng,
};
use kddn_preprocess::standardize;
use kddn_solver::solve_ddn;
use tracing::{debug, info};

/// Settings of the permutation-calibrated fusion penalty search.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lambda2Search {
    /// Number of label permutations averaged.
    pub trials: usize,
    /// Increment used while bracketing the target rate.
    pub step: f64,
    /// Accepted distance between the null rate and `alpha`.
    pub rate_tolerance: f64,
    /// Bisection stops once the bracket is this narrow.
    pub min_bracket: f64,
    /// Bracket expansions allowed per trial.
    pub max_bracket_steps: usize,
}

impl Default for Lambda2Search {
    fn default() -> Self {
        Self {
            trials: 100,
            step: 0.035,
            rate_tolerance: 0.001,
            min_bracket: 0.01,
            max_bracket_steps: 10_000,
        }
    }
}

impl Lambda2Search {
    pub fn validate(&self) -> Result<(), KddnError> {
        if self.trials == 0 {
            return Err(KddnError::invalid_input("lambda2 search needs at least one trial"));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(KddnError::invalid_input(format!(
                "lambda2 step must be finite and > 0; got {}",
                self.step
            )));
        }
        if self.rate_tolerance.is_nan()
            || self.rate_tolerance < 0.0
            || self.min_bracket.is_nan()
            || self.min_bracket <= 0.0
        {
            return Err(KddnError::invalid_input(
                "lambda2 rate_tolerance must be >= 0 and min_bracket > 0",
            ));
        }
        Ok(())
    }
}

fn above(rate: Option<f64>, alpha: f64) -> bool {
    rate.is_some_and(|value| value > alpha)
}

fn below(rate: Option<f64>, alpha: f64) -> bool {
    rate.is_some_and(|value| value < alpha)
}

/// Finds the fusion penalty at which label-permuted data show a differential
/// rate of about `alpha`.
///
/// Each trial permutes the pooled raw samples, standardizes both halves, and
/// brackets then bisects `lambda2` against the null differential rate. The
/// bracket and midpoint carry over between trials; the result is the mean
/// midpoint. An empty permuted network ends the trial's search.
#[allow(clippy::too_many_arguments)]
pub fn find_lambda2(
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    lambda1: f64,
    alpha: f64,
    seed: u64,
    search: &Lambda2Search,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<f64, KddnError> {
    search.validate()?;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(KddnError::invalid_input(format!(
            "alpha must lie in (0, 1); got {alpha}"
        )));
    }
    let ctx = ctx.with_phase(RunPhase::Lambda2Search);
    let prior = PriorKnowledge::empty(data1.n_vars());

    let mut low = 0.0f64;
    let mut high = 0.0f64;
    let mut mid = 0.0f64;
    let mut total = 0.0;

    for trial in 0..search.trials {
        ctx.check_cancelled()?;
        let mut rng = trial_rng(seed, SeedStream::Lambda2, trial);
        let (raw1, raw2) = permuted_split(data1, data2, &mut rng)?;
        let perm1 = standardize(&raw1);
        let perm2 = standardize(&raw2);

        let null_rate = |lambda2: f64| -> Result<Option<f64>, KddnError> {
            ctx.check_cancelled()?;
            let network = solve_ddn(
                &perm1,
                &perm2,
                &prior,
                &PenaltyParams::new(lambda1, lambda2, 0.0),
                solver,
                &ctx,
            )?;
            Ok(null_differential_rate(&network.beta))
        };

        let mut lambda2 = mid;
        let mut rate = null_rate(lambda2)?;
        let mut steps = 0usize;
        let mut bump = || {
            steps += 1;
            if steps > search.max_bracket_steps {
                return Err(KddnError::numerical_issue(format!(
                    "lambda2 bracket not found after {} steps in trial {trial}",
                    search.max_bracket_steps
                )));
            }
            Ok(())
        };

        if above(rate, alpha) {
            while above(rate, alpha) {
                bump()?;
                low = lambda2;
                lambda2 += search.step;
                high = lambda2;
                rate = null_rate(lambda2)?;
            }
        } else {
            while below(rate, alpha) {
                high = lambda2;
                if lambda2 <= 0.0 {
                    low = 0.0;
                    break;
                }
                bump()?;
                lambda2 = (lambda2 - search.step).max(0.0);
                low = lambda2;
                rate = null_rate(lambda2)?;
            }
        }

        mid = (high - low) / 2.0 + low;
        rate = null_rate(mid)?;
        while let Some(value) = rate
            && (value - alpha).abs() > search.rate_tolerance
            && high - low > search.min_bracket
        {
            if value > alpha {
                low = mid;
            } else {
                high = mid;
            }
            mid = (high - low) / 2.0 + low;
            rate = null_rate(mid)?;
        }

        debug!(trial, mid, low, high, rate = ?rate, "lambda2 trial finished");
        total += mid;
        ctx.report_progress((trial + 1) as f64 / search.trials as f64);
    }

    let lambda2 = total / search.trials as f64;
    info!(lambda2, trials = search.trials, "lambda2 resolved");
    Ok(lambda2)
}
