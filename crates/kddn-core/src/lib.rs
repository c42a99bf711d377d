// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod knowledge;
pub mod matrix;
pub mod network;
pub mod observability;
pub mod repro;

pub use config::{NonConvergencePolicy, Param, PenaltyParams, RunConfig, SolverConfig};
pub use control::{CancelSignal, CancelToken};
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, RunDiagnostics};
pub use error::{KddnError, RunPhase};
pub use execution_context::{ExecutionContext, Parallelism};
pub use knowledge::{EdgeCondition, KnowledgeEdge, KnowledgeMapping, PriorKnowledge, map_knowledge};
pub use matrix::{ConditionMatrix, ConditionMatrixRepr, VariableSet};
pub use network::{
    BlockMatrix, CoefficientMatrix, DifferentialEdge, DifferentialLabel, DifferentialNetwork,
    NetworkResult, SignMatrix, differential_support, null_differential_rate, sign_of, total_edges,
};
pub use observability::ProgressSink;
pub use repro::{SeedStream, derive_seed, trial_rng};

/// Core shared types and traits for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-core"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_is_stable() {
        assert_eq!(super::crate_name(), "kddn-core");
    }
}
