// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod lambda1;
pub mod lambda2;
pub mod normal;
pub mod pvalue;
pub mod resample;
pub mod theta;

pub use lambda1::{MAX_LAMBDA1_REDUCTIONS, find_lambda1, initial_lambda1};
pub use lambda2::{Lambda2Search, find_lambda2};
pub use normal::qnorm;
pub use pvalue::calculate_pvalues;
pub use resample::{pair_from_index, permuted_split, random_prior};
pub use theta::{ThetaSearch, find_theta};

/// Hyperparameter search crate for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-search"
}
