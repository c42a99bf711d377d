// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{
    ConditionMatrix, ExecutionContext, NonConvergencePolicy, PenaltyParams, PriorKnowledge,
    SignMatrix, SolverConfig,
};
use kddn_preprocess::standardize;
use kddn_solver::{
    FusedPenalty, NodeProblem, solve2d, solve_ddn, solve_fused_pair, solve_node, symmetrized,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

const KKT_TOL: f64 = 1e-9;
const MIN_PROPTEST_CASES: u32 = 1000;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `u ∈ lambda · ∂|b|`.
fn in_lasso_subgradient(u: f64, b: f64, lambda: f64) -> bool {
    if b != 0.0 {
        (u - lambda * sign(b)).abs() < KKT_TOL
    } else {
        u.abs() <= lambda + KKT_TOL
    }
}

/// Zero is in the subdifferential of the fused objective at `(b1, b2)`.
fn satisfies_kkt(rho1: f64, rho2: f64, b1: f64, b2: f64, penalty: &FusedPenalty) -> bool {
    let (la, lb, l2) = (penalty.lambda_a, penalty.lambda_b, penalty.lambda2);
    if b1 != b2 {
        let t = sign(b1 - b2);
        return in_lasso_subgradient(rho1 - b1 - l2 * t, b1, la)
            && in_lasso_subgradient(rho2 - b2 + l2 * t, b2, lb);
    }
    if b1 != 0.0 {
        let s = sign(b1);
        let u1 = rho1 - b1 - la * s;
        let u2 = rho2 - b2 - lb * s;
        return (u1 + u2).abs() < KKT_TOL && u1.abs() <= l2 + KKT_TOL;
    }
    let low = (rho1 - la).max(-rho2 - lb).max(-l2);
    let high = (rho1 + la).min(-rho2 + lb).min(l2);
    low <= high + KKT_TOL
}

fn unit_column(values: &[f64]) -> Vec<f64> {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    values.iter().map(|v| v / norm).collect()
}

fn sign_matrix_strategy() -> impl Strategy<Value = SignMatrix> {
    (1usize..6).prop_flat_map(|p| {
        prop::collection::vec(prop::collection::vec(-1i8..=1, 2 * p), p).prop_map(|rows| {
            SignMatrix::from_rows(&rows).expect("generated rows have width 2p")
        })
    })
}

fn data_strategy() -> impl Strategy<Value = (ConditionMatrix, ConditionMatrix)> {
    (2usize..5, 5usize..10).prop_flat_map(|(p, n)| {
        (
            prop::collection::vec(-5.0f64..5.0, n * p),
            prop::collection::vec(-5.0f64..5.0, n * p),
        )
            .prop_map(move |(v1, v2)| {
                (
                    standardize(
                        &ConditionMatrix::from_column_major(n, p, v1).expect("finite values"),
                    ),
                    standardize(
                        &ConditionMatrix::from_column_major(n, p, v2).expect("finite values"),
                    ),
                )
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        max_shrink_iters: 1024,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct(
            "proptest-regressions/tests/proptest_invariants.txt"
        ))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn fused_pair_satisfies_optimality_conditions(
        rho1 in -3.0f64..3.0,
        rho2 in -3.0f64..3.0,
        lambda_a in 0.0f64..1.0,
        lambda_b in 0.0f64..1.0,
        lambda2 in 0.0f64..1.0,
    ) {
        let penalty = FusedPenalty::new(lambda_a, lambda_b, lambda2);
        let step = solve_fused_pair(rho1, rho2, &penalty);
        prop_assert!(
            satisfies_kkt(rho1, rho2, step.b1, step.b2, &penalty),
            "rho=({rho1}, {rho2}), step={step:?}"
        );
    }

    #[test]
    fn single_predictor_solve_equals_direct_subproblem(
        raw in prop::collection::vec(-2.0f64..2.0, 4 * 6),
        lambda_a in 0.01f64..0.8,
        lambda_b in 0.01f64..0.8,
        lambda2 in 0.0f64..0.5,
    ) {
        let y1 = unit_column(&raw[0..6]);
        let y2 = unit_column(&raw[6..12]);
        let x1 = unit_column(&raw[12..18]);
        let x2 = unit_column(&raw[18..24]);
        prop_assume!(x1.iter().all(|v| v.is_finite()) && x2.iter().all(|v| v.is_finite()));
        prop_assume!(y1.iter().all(|v| v.is_finite()) && y2.iter().all(|v| v.is_finite()));
        let lambda1 = [lambda_a, lambda_b];

        let problem = NodeProblem::new(
            &y1,
            &y2,
            vec![x1.as_slice()],
            vec![x2.as_slice()],
            &lambda1,
            lambda2,
        )
        .expect("valid problem");
        let solution = solve_node(&problem, &SolverConfig::default());
        let direct = solve2d(&y1, &y2, &x1, &x2, &FusedPenalty::new(lambda_a, lambda_b, lambda2));
        prop_assert_eq!(solution.beta1[0], direct.b1);
        prop_assert_eq!(solution.beta2[0], direct.b2);
    }

    #[test]
    fn symmetrize_is_idempotent_and_symmetric(adjacency in sign_matrix_strategy()) {
        let once = symmetrized(&adjacency);
        let twice = symmetrized(&once);
        prop_assert_eq!(&once, &twice);
        let p = once.p();
        for i in 0..p {
            for j in 0..p {
                if i != j {
                    prop_assert_eq!(once.first(i, j), once.first(j, i));
                    prop_assert_eq!(once.second(i, j), once.second(j, i));
                }
            }
        }
    }

    #[test]
    fn solved_networks_have_empty_diagonal_and_symmetric_signs(
        (data1, data2) in data_strategy(),
        lambda1 in 0.05f64..0.8,
        lambda2 in 0.0f64..0.3,
    ) {
        let p = data1.n_vars();
        let solver = SolverConfig {
            non_convergence: NonConvergencePolicy::SkipNode,
            ..SolverConfig::default()
        };
        let result = solve_ddn(
            &data1,
            &data2,
            &PriorKnowledge::empty(p),
            &PenaltyParams::new(lambda1, lambda2, 0.0),
            &solver,
            &ExecutionContext::new(),
        )
        .expect("generated inputs are valid");

        for i in 0..p {
            prop_assert_eq!(result.beta.first(i, i), 0.0);
            prop_assert_eq!(result.beta.second(i, i), 0.0);
            for j in 0..p {
                prop_assert_eq!(result.adjacency.first(i, j), result.adjacency.first(j, i));
                prop_assert_eq!(result.adjacency.second(i, j), result.adjacency.second(j, i));
            }
        }
        for edge in &result.differential_edges {
            prop_assert!(edge.source < edge.target);
            prop_assert!(edge.p_value.is_none());
        }
    }
}
