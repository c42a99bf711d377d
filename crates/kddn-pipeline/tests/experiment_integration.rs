// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{
    CancelToken, ConditionMatrix, EdgeCondition, ExecutionContext, KnowledgeEdge, Param,
    RunConfig,
};
use kddn_pipeline::{EdgeKind, ExperimentInput, KddnExperiment, run_experiment};
use kddn_search::{Lambda2Search, ThetaSearch};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;

/// Condition one couples g1 and g2; g3 is listed twice with identical
/// values so variable selection keeps its first column.
fn coupled_input(seed: u64, n: usize) -> ExperimentInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).expect("valid normal");
    let mut rows1 = Vec::with_capacity(n);
    for _ in 0..n {
        let a = 3.0 * normal.sample(&mut rng);
        let b = a + 0.3 * normal.sample(&mut rng);
        let c = normal.sample(&mut rng);
        rows1.push([a, b, c, c]);
    }
    let rows2: Vec<[f64; 4]> = (0..n)
        .map(|_| {
            let a = normal.sample(&mut rng);
            let b = normal.sample(&mut rng);
            let c = normal.sample(&mut rng);
            [a, b, c, c]
        })
        .collect();
    ExperimentInput::two_condition(
        vec!["g1".into(), "g2".into(), "g3".into(), "g3".into()],
        ConditionMatrix::from_rows(&rows1).expect("finite rows"),
        ConditionMatrix::from_rows(&rows2).expect("finite rows"),
    )
}

#[test]
fn two_condition_run_recovers_the_injected_edge_with_p_value() {
    let input = coupled_input(17, 20);
    let config = RunConfig {
        lambda1: Param::Fixed(0.5),
        lambda2: Param::Fixed(0.1),
        theta: Param::Fixed(0.0),
        need_pvalue: true,
        num_permutation: 300,
        seed: 3,
        ..RunConfig::default()
    };
    let progress = Mutex::new(Vec::new());
    let sink = |fraction: f64| progress.lock().expect("lock").push(fraction);
    let ctx = ExecutionContext::new().with_progress_sink(&sink);

    let result = run_experiment(&input, &config, &ctx).expect("experiment should run");
    assert_eq!(result.variables.names(), ["g1", "g2", "g3"]);
    assert_eq!(result.preprocessing[0].vars_in, 4);
    assert_eq!(result.preprocessing[0].vars_out, 3);
    assert_eq!(result.params.lambda1, 0.5);
    assert_eq!(result.params.lambda2, 0.1);
    assert_eq!(result.params.knowledge_edge_count, 0);

    let edge = result
        .edges()
        .into_iter()
        .find(|edge| edge.source == "g1" && edge.target == "g2")
        .expect("g1-g2 should be differential");
    assert_eq!(edge.kind, EdgeKind::ConditionOne);
    let p_value = edge.p_value.expect("p-value requested");
    assert!(p_value < 0.05, "p-value {p_value}");

    let values = progress.lock().expect("lock").clone();
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(values.last().copied(), Some(1.0));
    assert_eq!(result.diagnostics.p, 3);
    assert_eq!(result.diagnostics.n1, 20);
    assert!(result.diagnostics.runtime_ms.is_some());
}

#[test]
fn single_condition_run_tunes_theta_from_knowledge() {
    let input = coupled_input(41, 25);
    let input = ExperimentInput::single_condition(input.names, input.data1).with_knowledge(vec![
        KnowledgeEdge::new("G1", "g3", EdgeCondition::Both),
        KnowledgeEdge::new("g1", "unknown", EdgeCondition::Both),
    ]);
    let experiment = KddnExperiment::new(RunConfig {
        two_condition: false,
        ..RunConfig::default()
    })
    .with_theta_search(ThetaSearch {
        trials: 3,
        ..ThetaSearch::default()
    });

    let result = experiment
        .run(&input, &ExecutionContext::new())
        .expect("experiment should run");
    assert_eq!(result.params.lambda2, 0.0);
    assert_eq!(result.params.knowledge_edge_count, 1);
    assert!((0.02..=0.5).contains(&result.params.theta));
    assert!(result.params.lambda1 > 0.0);
    assert!(
        result
            .edges()
            .iter()
            .all(|edge| edge.kind == EdgeKind::Static && edge.p_value.is_none())
    );
    assert!(
        result
            .diagnostics
            .warnings
            .iter()
            .any(|warning| warning.contains("unknown=1"))
    );
}

#[cfg(feature = "rayon")]
#[test]
fn dedicated_pool_runs_auto_lambda2() {
    let input = coupled_input(7, 16);
    let experiment = KddnExperiment::new(RunConfig {
        lambda1: Param::Fixed(0.4),
        num_threads: Some(2),
        ..RunConfig::default()
    })
    .with_lambda2_search(Lambda2Search {
        trials: 3,
        ..Lambda2Search::default()
    });

    let result = experiment
        .run(&input, &ExecutionContext::new())
        .expect("experiment should run");
    assert!(result.params.lambda2 >= 0.0);
    assert_eq!(result.params.theta, 0.0);
    assert_eq!(result.diagnostics.thread_count, Some(2));
}

#[test]
fn cancelled_experiment_returns_cancelled() {
    let input = coupled_input(3, 12);
    let cancel = CancelToken::new();
    cancel.cancel();
    let ctx = ExecutionContext::new().with_cancel(&cancel);
    let err = run_experiment(&input, &RunConfig::default(), &ctx).expect_err("cancelled");
    assert!(err.is_cancelled());
}
