// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod pipeline;
pub mod selection;
pub mod standardize;

pub use pipeline::{PreprocessConfig, PreprocessPipeline, PreprocessedData, StepReport, preprocess};
pub use selection::{VariableSelection, select_variables, welch_t_test};
pub use standardize::{standardize, standardize_column};

/// Preprocessing utilities for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-preprocess"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_is_stable() {
        assert_eq!(super::crate_name(), "kddn-preprocess");
    }
}
