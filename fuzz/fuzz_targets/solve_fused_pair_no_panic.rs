// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use kddn_solver::{FusedPenalty, solve_fused_pair};
use libfuzzer_sys::fuzz_target;

fn penalty_value(mode_seed: u8, raw: f64) -> f64 {
    match mode_seed % 6 {
        0 => 0.0,
        1 => raw.abs(),
        2 => raw.abs() * 1e-9,
        3 => raw.abs() * 1e6,
        4 => 1.0,
        _ => raw.abs().sqrt(),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let rho1 = cursor.next_unit(10.0);
    let rho2 = cursor.next_unit(10.0);
    let penalty = FusedPenalty::new(
        penalty_value(cursor.next_u8(), cursor.next_unit(5.0)),
        penalty_value(cursor.next_u8(), cursor.next_unit(5.0)),
        penalty_value(cursor.next_u8(), cursor.next_unit(5.0)),
    );

    let step = solve_fused_pair(rho1, rho2, &penalty);
    assert!(step.b1.is_finite() && step.b2.is_finite());
    // Shrinkage never grows a coefficient past its unpenalized value.
    assert!(step.b1.abs() <= rho1.abs() + penalty.lambda2 + 1e-9);
    assert!(step.b2.abs() <= rho2.abs() + penalty.lambda2 + 1e-9);
});
