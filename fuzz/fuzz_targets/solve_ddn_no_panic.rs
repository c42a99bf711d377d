// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use kddn_core::{
    ConditionMatrix, ExecutionContext, NonConvergencePolicy, Parallelism, PenaltyParams,
    PriorKnowledge, SolverConfig,
};
use kddn_solver::solve_ddn;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let n = common::bounded(cursor.next_u8(), 0, 12);
    let p = common::bounded(cursor.next_u8(), 1, 5);

    let Ok(data1) = ConditionMatrix::from_fn(n, p, |_, _| cursor.next_unit(4.0)) else {
        return;
    };
    let Ok(data2) = ConditionMatrix::from_fn(n, p, |_, _| cursor.next_unit(4.0)) else {
        return;
    };

    let mut prior = PriorKnowledge::empty(p);
    if p > 1 && cursor.next_u8() & 1 == 1 {
        let _ = prior.assert_pair(0, p - 1, kddn_core::EdgeCondition::Both);
    }
    let params = PenaltyParams::new(
        0.01 + f64::from(cursor.next_u8()) / 128.0,
        f64::from(cursor.next_u8()) / 255.0,
        f64::from(cursor.next_u8() % 51) / 100.0,
    );
    let solver = SolverConfig {
        max_sweeps: common::bounded(cursor.next_u8(), 1, 500),
        non_convergence: NonConvergencePolicy::SkipNode,
        ..SolverConfig::default()
    };
    let ctx = ExecutionContext::new().with_parallelism(Parallelism::Sequential);

    if let Ok(network) = solve_ddn(&data1, &data2, &prior, &params, &solver, &ctx) {
        for i in 0..p {
            for j in 0..p {
                assert_eq!(network.adjacency.first(i, j), network.adjacency.first(j, i));
                assert_eq!(network.adjacency.second(i, j), network.adjacency.second(j, i));
            }
            assert_eq!(network.beta.first(i, i), 0.0);
        }
    }
});
