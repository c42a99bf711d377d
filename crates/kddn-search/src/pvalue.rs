// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::resample::permuted_split;
use kddn_core::{
    ConditionMatrix, ExecutionContext, KddnError, NetworkResult, PenaltyParams, PriorKnowledge,
    RunPhase, SeedStream, SolverConfig, differential_support, trial_rng,
};
use kddn_preprocess::standardize;
use kddn_solver::solve_ddn;
use tracing::{debug, info};

/// Attaches permutation p-values to the differential edges of `network`.
///
/// `raw1` and `raw2` are the unstandardized inputs the network was fitted
/// on. Each permutation refits the model on a label-shuffled split with the
/// same prior and penalties and counts, per directed coefficient, how often
/// the null fit is differential. The p-value of edge `(i, j)` is the smaller
/// of the two directed counts over the number of permutations.
#[allow(clippy::too_many_arguments)]
pub fn calculate_pvalues(
    network: &NetworkResult,
    raw1: &ConditionMatrix,
    raw2: &ConditionMatrix,
    prior: &PriorKnowledge,
    params: &PenaltyParams,
    num_permutation: usize,
    seed: u64,
    solver: &SolverConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<NetworkResult, KddnError> {
    if num_permutation == 0 {
        return Err(KddnError::invalid_input("p-values need at least one permutation"));
    }
    let p = network.p();
    if raw1.n_vars() != p || raw2.n_vars() != p {
        return Err(KddnError::invalid_input(format!(
            "network has {p} variables but data have {} and {}",
            raw1.n_vars(),
            raw2.n_vars()
        )));
    }
    let ctx = ctx.with_phase(RunPhase::Permutation);

    let mut counts = vec![0usize; p * p];
    for trial in 0..num_permutation {
        ctx.check_cancelled()?;
        let mut rng = trial_rng(seed, SeedStream::Permutation, trial);
        let (perm1, perm2) = permuted_split(raw1, raw2, &mut rng)?;
        let null = solve_ddn(
            &standardize(&perm1),
            &standardize(&perm2),
            prior,
            params,
            solver,
            &ctx,
        )?;
        for (count, differential) in counts.iter_mut().zip(differential_support(&null.beta)) {
            *count += usize::from(differential);
        }
        ctx.report_progress((trial + 1) as f64 / num_permutation as f64);
    }

    let mut result = network.clone();
    attach_pvalues(&mut result, &counts, num_permutation);
    info!(
        edges = result.differential_edges.len(),
        num_permutation, "p-values computed"
    );
    Ok(result)
}

/// Sets each differential edge's p-value from directed null counts: the
/// smaller of the two directions over `num_permutation`.
fn attach_pvalues(result: &mut NetworkResult, counts: &[usize], num_permutation: usize) {
    let p = result.p();
    for edge in &mut result.differential_edges {
        let forward = counts[edge.source * p + edge.target];
        let backward = counts[edge.target * p + edge.source];
        edge.p_value = Some(forward.min(backward) as f64 / num_permutation as f64);
        debug!(
            source = edge.source,
            target = edge.target,
            p_value = edge.p_value,
            "edge p-value"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{attach_pvalues, calculate_pvalues};
    use kddn_core::{
        CoefficientMatrix, ConditionMatrix, ExecutionContext, NetworkResult, PenaltyParams,
        PriorKnowledge, SolverConfig,
    };

    /// Three variables; pairs (0, 1) and (1, 2) exist in condition one only.
    fn two_edge_network() -> NetworkResult {
        let beta = CoefficientMatrix::from_rows(&[
            [0.0, 0.4, 0.0, 0.0, 0.0, 0.0],
            [0.4, 0.0, -0.2, 0.0, 0.0, 0.0],
            [0.0, -0.2, 0.0, 0.0, 0.0, 0.0],
        ])
        .expect("valid rows");
        let adjacency = beta.signs();
        NetworkResult::new(beta, adjacency, vec![])
    }

    #[test]
    fn p_value_is_the_smaller_directed_count_over_permutations() {
        let mut network = two_edge_network();
        assert_eq!(network.differential_edges.len(), 2);
        let mut counts = vec![0usize; 9];
        counts[1] = 7; // (0, 1)
        counts[3] = 3; // (1, 0)
        counts[5] = 0; // (1, 2)
        counts[7] = 9; // (2, 1)

        attach_pvalues(&mut network, &counts, 20);
        let p_values: Vec<_> = network
            .differential_edges
            .iter()
            .map(|edge| (edge.source, edge.target, edge.p_value))
            .collect();
        assert_eq!(p_values, vec![(0, 1, Some(0.15)), (1, 2, Some(0.0))]);
    }

    #[test]
    fn zero_permutations_and_shape_mismatch_are_rejected() {
        let beta = CoefficientMatrix::zeros(2);
        let adjacency = beta.signs();
        let network = NetworkResult::new(beta, adjacency, vec![]);
        let data = ConditionMatrix::from_rows(&[[1.0, 2.0], [2.0, 1.0], [3.0, 5.0]])
            .expect("valid rows");
        let wide = ConditionMatrix::from_rows(&[[1.0, 2.0, 3.0], [2.0, 1.0, 0.0]])
            .expect("valid rows");
        let prior = PriorKnowledge::empty(2);
        let params = PenaltyParams::new(0.5, 0.1, 0.0);
        let ctx = ExecutionContext::new();

        let err = calculate_pvalues(
            &network, &data, &data, &prior, &params, 0, 1, &SolverConfig::default(), &ctx,
        )
        .expect_err("zero permutations");
        assert!(err.to_string().contains("permutation"));
        calculate_pvalues(
            &network, &data, &wide, &prior, &params, 5, 1, &SolverConfig::default(), &ctx,
        )
        .expect_err("shape mismatch");
    }
}
