// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::normal::qnorm;
use kddn_core::{
    ConditionMatrix, ExecutionContext, KddnError, PenaltyParams, PriorKnowledge, RunPhase,
    SolverConfig, total_edges,
};
use kddn_preprocess::standardize;
use kddn_solver::solve_ddn;
use tracing::{debug, info};

/// Reductions by a factor of four before the search gives up.
pub const MAX_LAMBDA1_REDUCTIONS: usize = 64;

/// Starting sparsity penalty `(2/m)·Φ⁻¹(1 − 0.05/(2·p·m²))` with
/// `m = (n1 + n2)/2`.
pub fn initial_lambda1(n1: usize, n2: usize, p: usize) -> Result<f64, KddnError> {
    if p == 0 || n1 + n2 == 0 {
        return Err(KddnError::invalid_input(format!(
            "lambda1 needs samples and variables; got n1={n1}, n2={n2}, p={p}"
        )));
    }
    let m = (n1 + n2) as f64 / 2.0;
    Ok(2.0 / m * qnorm(1.0 - 0.05 / 2.0 / p as f64 / (m * m))?)
}

/// Finds a sparsity penalty that leaves a nonempty network.
///
/// Starts from [`initial_lambda1`] on standardized copies of the data and
/// divides by four while the network of both conditions has no edge, with
/// no fusion and no knowledge.
pub fn find_lambda1(
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<f64, KddnError> {
    let ctx = ctx.with_phase(RunPhase::Lambda1Search);
    let p = data1.n_vars();
    let mut lambda1 = initial_lambda1(data1.n_samples(), data2.n_samples(), p)?;
    let std1 = standardize(data1);
    let std2 = standardize(data2);
    let prior = PriorKnowledge::empty(p);

    for reduction in 0..=MAX_LAMBDA1_REDUCTIONS {
        ctx.check_cancelled()?;
        let network = solve_ddn(
            &std1,
            &std2,
            &prior,
            &PenaltyParams::new(lambda1, 0.0, 0.0),
            solver,
            &ctx,
        )?;
        let edges = total_edges(&network.adjacency);
        debug!(lambda1, edges, reduction, "lambda1 candidate");
        if edges > 0 {
            info!(lambda1, edges, "lambda1 resolved");
            return Ok(lambda1);
        }
        lambda1 /= 4.0;
    }

    Err(KddnError::numerical_issue(format!(
        "no edges after {MAX_LAMBDA1_REDUCTIONS} lambda1 reductions; data may have no correlated variables"
    )))
}
