// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod bcd;
pub mod fused;
pub mod orchestrator;
pub mod symmetrize;

pub use bcd::{NodeProblem, NodeSolution, SolveOutcome, solve_node};
pub use fused::{FusedPenalty, FusedRegion, FusedStep, solve2d, solve_fused_pair};
pub use orchestrator::{effective_penalties, solve_ddn};
pub use symmetrize::{symmetrize, symmetrized};

/// Solver crate for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-solver"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_is_stable() {
        assert_eq!(super::crate_name(), "kddn-solver");
    }
}
