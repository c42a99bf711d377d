// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

#[cfg(feature = "serde")]
pub mod config_io;
pub mod experiment;
pub mod result;

#[cfg(feature = "serde")]
pub use config_io::{parse_experiment_config, parse_run_config};
pub use experiment::{ExperimentInput, KddnExperiment, run_experiment};
pub use result::{EdgeKind, ExperimentResult, NamedEdge, ResolvedParams};

/// Experiment pipeline crate for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-pipeline"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_is_stable() {
        assert_eq!(super::crate_name(), "kddn-pipeline");
    }
}
