// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::bcd::{NodeProblem, SolveOutcome, solve_node};
use crate::symmetrize::symmetrize;
use kddn_core::{
    CoefficientMatrix, ConditionMatrix, ExecutionContext, KddnError, NetworkResult,
    NonConvergencePolicy, Parallelism, PenaltyParams, PriorKnowledge, SolverConfig,
};
use tracing::{debug, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Knowledge-adjusted lasso weights of one node's `2(p-1)` predictors:
/// `(1 - theta·W[node][j]) · lambda1` for every `j != node`, condition one
/// first.
pub fn effective_penalties(
    prior: &PriorKnowledge,
    node: usize,
    params: &PenaltyParams,
) -> Vec<f64> {
    let p = prior.p();
    let mut weights = Vec::with_capacity(2 * p.saturating_sub(1));
    for offset in [0, p] {
        for j in (0..p).filter(|&j| j != node) {
            weights.push((1.0 - params.theta * prior.weight(node, j + offset)) * params.lambda1);
        }
    }
    weights
}

/// Column of row `node` that predictor `a` belongs to.
fn predictor_column(node: usize, a: usize) -> usize {
    if a < node { a } else { a + 1 }
}

enum RowStatus {
    Converged,
    Skipped,
}

#[allow(clippy::too_many_arguments)]
fn solve_row(
    node: usize,
    row: &mut [f64],
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    prior: &PriorKnowledge,
    params: &PenaltyParams,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<RowStatus, KddnError> {
    let p = data1.n_vars();
    let others = (0..p).filter(|&j| j != node);
    let x1 = others.clone().map(|j| data1.column(j)).collect();
    let x2 = others.map(|j| data2.column(j)).collect();
    let lambda1 = effective_penalties(prior, node, params);
    let problem = NodeProblem::new(
        data1.column(node),
        data2.column(node),
        x1,
        x2,
        &lambda1,
        params.lambda2,
    )?;

    let solution = solve_node(&problem, solver);
    if let SolveOutcome::IterationLimitExceeded { sweeps, last_change } = solution.outcome {
        return match solver.non_convergence {
            NonConvergencePolicy::Abort => Err(KddnError::not_converged(node, sweeps, ctx.phase)),
            NonConvergencePolicy::SkipNode => {
                warn!(
                    node,
                    sweeps,
                    last_change,
                    phase = %ctx.phase,
                    "node skipped after sweep limit"
                );
                Ok(RowStatus::Skipped)
            }
        };
    }

    for (a, (&b1, &b2)) in solution.beta1.iter().zip(&solution.beta2).enumerate() {
        let col = predictor_column(node, a);
        row[col] = b1;
        row[col + p] = b2;
    }
    Ok(RowStatus::Converged)
}

#[cfg(feature = "rayon")]
fn can_use_parallel(ctx: &ExecutionContext<'_>, p: usize) -> bool {
    ctx.parallelism == Parallelism::Parallel && p > 1
}

#[cfg(not(feature = "rayon"))]
#[allow(dead_code)]
fn can_use_parallel(_ctx: &ExecutionContext<'_>, _p: usize) -> bool {
    false
}

/// Fits every nodewise regression and assembles the two-condition network.
///
/// `data1` and `data2` are expected to be standardized. Rows of the
/// coefficient matrix are solved independently, on the rayon pool when the
/// context allows it; the result is identical either way.
pub fn solve_ddn(
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
    prior: &PriorKnowledge,
    params: &PenaltyParams,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<NetworkResult, KddnError> {
    let p = data1.n_vars();
    if p == 0 {
        return Err(KddnError::invalid_input("network needs at least one variable"));
    }
    if data2.n_vars() != p || prior.p() != p {
        return Err(KddnError::invalid_input(format!(
            "variable count mismatch: data1={p}, data2={}, prior={}",
            data2.n_vars(),
            prior.p()
        )));
    }
    params.validate()?;
    solver.validate()?;
    ctx.check_cancelled()?;

    let mut beta = CoefficientMatrix::zeros(p);
    let width = 2 * p;
    let run_row = |(node, row): (usize, &mut [f64])| {
        solve_row(node, row, data1, data2, prior, params, solver, ctx)
    };

    #[cfg(feature = "rayon")]
    let statuses: Vec<RowStatus> = if can_use_parallel(ctx, p) {
        beta.as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .map(run_row)
            .collect::<Result<Vec<_>, KddnError>>()?
    } else {
        beta.as_mut_slice()
            .chunks_mut(width)
            .enumerate()
            .map(run_row)
            .collect::<Result<Vec<_>, KddnError>>()?
    };

    #[cfg(not(feature = "rayon"))]
    let statuses: Vec<RowStatus> = beta
        .as_mut_slice()
        .chunks_mut(width)
        .enumerate()
        .map(run_row)
        .collect::<Result<Vec<_>, KddnError>>()?;

    let unconverged_nodes: Vec<usize> = statuses
        .iter()
        .enumerate()
        .filter_map(|(node, status)| matches!(status, RowStatus::Skipped).then_some(node))
        .collect();

    let mut adjacency = beta.signs();
    symmetrize(&mut adjacency);
    let result = NetworkResult::new(beta, adjacency, unconverged_nodes);

    debug!(
        p,
        lambda1 = params.lambda1,
        lambda2 = params.lambda2,
        theta = params.theta,
        edges = result.total_edges(),
        differential = result.differential_edges.len(),
        phase = %ctx.phase,
        "network solved"
    );
    Ok(result)
}
