// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::resample::random_prior;
use kddn_core::{
    ConditionMatrix, ExecutionContext, KddnError, PenaltyParams, PriorKnowledge, RunPhase,
    SeedStream, SignMatrix, SolverConfig, total_edges, trial_rng,
};
use kddn_preprocess::standardize;
use kddn_solver::solve_ddn;
use tracing::{debug, info};

/// Settings of the knowledge-weight search.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThetaSearch {
    /// Random priors drawn per evaluated weight.
    pub trials: usize,
    pub low: f64,
    pub high: f64,
    pub min_bracket: f64,
}

impl Default for ThetaSearch {
    fn default() -> Self {
        Self {
            trials: 100,
            low: 0.02,
            high: 0.5,
            min_bracket: 0.01,
        }
    }
}

impl ThetaSearch {
    pub fn validate(&self) -> Result<(), KddnError> {
        if self.trials == 0 {
            return Err(KddnError::invalid_input("theta search needs at least one trial"));
        }
        if !(self.low >= 0.0 && self.low < self.high && self.high <= kddn_core::config::MAX_THETA)
        {
            return Err(KddnError::invalid_input(format!(
                "theta bracket must satisfy 0 <= low < high <= {}; got [{}, {}]",
                kddn_core::config::MAX_THETA,
                self.low,
                self.high
            )));
        }
        if self.min_bracket.is_nan() || self.min_bracket <= 0.0 {
            return Err(KddnError::invalid_input("theta min_bracket must be > 0"));
        }
        Ok(())
    }
}

/// Adjacency pairs `i < j` whose sign differs between two networks, summed
/// over both conditions.
fn adjacency_mismatches(left: &SignMatrix, right: &SignMatrix) -> usize {
    let p = left.p();
    let mut count = 0;
    for i in 0..p {
        for j in i + 1..p {
            count += usize::from(left.first(i, j) != right.first(i, j));
            count += usize::from(left.second(i, j) != right.second(i, j));
        }
    }
    count
}

struct ThetaProblem<'s, 'c> {
    data1: ConditionMatrix,
    data2: ConditionMatrix,
    baseline: SignMatrix,
    baseline_edges: usize,
    lambda1: f64,
    lambda2: f64,
    knowledge_edges: usize,
    seed: u64,
    trials: usize,
    solver: &'s SolverConfig,
    ctx: ExecutionContext<'c>,
}

impl ThetaProblem<'_, '_> {
    /// Mean relative change of the network when `knowledge_edges` random
    /// pairs are favoured with weight `theta`.
    fn deviation(&self, theta: f64, evaluation: usize) -> Result<f64, KddnError> {
        let p = self.data1.n_vars();
        let params = PenaltyParams::new(self.lambda1, self.lambda2, theta);
        let mut errors = 0usize;
        for trial in 0..self.trials {
            self.ctx.check_cancelled()?;
            let mut rng = trial_rng(
                self.seed,
                SeedStream::Theta,
                evaluation * self.trials + trial,
            );
            let prior = random_prior(p, self.knowledge_edges, &mut rng)?;
            let network = solve_ddn(
                &self.data1,
                &self.data2,
                &prior,
                &params,
                self.solver,
                &self.ctx,
            )?;
            errors += adjacency_mismatches(&self.baseline, &network.adjacency);
        }
        Ok(errors as f64 / self.trials as f64 / self.baseline_edges.max(1) as f64)
    }
}

/// Finds the largest knowledge weight whose effect on a random prior of the
/// same size stays near `delta`.
///
/// The bracket `[low, high]` is bisected until narrower than `min_bracket`:
/// a deviation above `delta` lowers `high`, anything else raises `low`.
#[allow(clippy::too_many_arguments)]
pub fn find_theta(
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    lambda1: f64,
    lambda2: f64,
    knowledge_edges: usize,
    delta: f64,
    seed: u64,
    search: &ThetaSearch,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<f64, KddnError> {
    search.validate()?;
    let p = data1.n_vars();
    let pairs = p * p.saturating_sub(1) / 2;
    if knowledge_edges == 0 || knowledge_edges > pairs {
        return Err(KddnError::invalid_input(format!(
            "theta search needs between 1 and {pairs} knowledge edges; got {knowledge_edges}"
        )));
    }
    if !delta.is_finite() || delta <= 0.0 {
        return Err(KddnError::invalid_input(format!(
            "delta must be finite and > 0; got {delta}"
        )));
    }
    let ctx = ctx.with_phase(RunPhase::ThetaSearch);
    ctx.check_cancelled()?;

    let std1 = standardize(data1);
    let std2 = standardize(data2);
    let baseline = solve_ddn(
        &std1,
        &std2,
        &PriorKnowledge::empty(p),
        &PenaltyParams::new(lambda1, lambda2, 0.0),
        solver,
        &ctx,
    )?;
    let baseline_edges = total_edges(&baseline.adjacency);
    let problem = ThetaProblem {
        data1: std1,
        data2: std2,
        baseline: baseline.adjacency,
        baseline_edges,
        lambda1,
        lambda2,
        knowledge_edges,
        seed,
        trials: search.trials,
        solver,
        ctx,
    };

    let mut high = search.high;
    let mut low = search.low;
    let mut mid = (high - low) / 2.0 + low;
    let mut evaluation = 0;
    let mut deviation = problem.deviation(mid, evaluation)?;

    let mut portion = 0.2;
    let mut remaining = 1.0;
    while high - low > search.min_bracket {
        if deviation > delta {
            high = mid;
        } else {
            low = mid;
        }
        mid = (high - low) / 2.0 + low;
        evaluation += 1;
        deviation = problem.deviation(mid, evaluation)?;
        debug!(theta = mid, deviation, low, high, "theta candidate");

        let step = remaining * portion;
        remaining -= step;
        portion += 0.05;
        ctx.report_progress(1.0 - remaining);
    }

    info!(theta = mid, deviation, baseline_edges, "theta resolved");
    Ok(mid)
}
