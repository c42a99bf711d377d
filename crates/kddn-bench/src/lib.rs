// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{ConditionMatrix, KddnError};
use kddn_preprocess::standardize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Seeded two-condition data with `p` variables where variable `2k + 1`
/// follows variable `2k` in condition one only.
pub fn chain_data(
    seed: u64,
    n: usize,
    p: usize,
) -> Result<(ConditionMatrix, ConditionMatrix), KddnError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|err| KddnError::invalid_input(format!("normal distribution: {err}")))?;
    let first = ConditionMatrix::from_fn(n, p, |_, _| normal.sample(&mut rng))?;
    let mut columns: Vec<Vec<f64>> = first.columns().map(<[f64]>::to_vec).collect();
    for pair in (0..p.saturating_sub(1)).step_by(2) {
        for sample in 0..n {
            columns[pair + 1][sample] = columns[pair][sample] + 0.3 * columns[pair + 1][sample];
        }
    }
    let data1 = ConditionMatrix::from_column_major(n, p, columns.concat())?;
    let data2 = ConditionMatrix::from_fn(n, p, |_, _| normal.sample(&mut rng))?;
    Ok((data1, data2))
}

/// [`chain_data`] after per-column standardization.
pub fn standardized_chain_data(
    seed: u64,
    n: usize,
    p: usize,
) -> Result<(ConditionMatrix, ConditionMatrix), KddnError> {
    let (data1, data2) = chain_data(seed, n, p)?;
    Ok((standardize(&data1), standardize(&data2)))
}

/// Benchmark fixtures crate for kddn-rs.
pub fn crate_name() -> &'static str {
    "kddn-bench"
}

#[cfg(test)]
mod tests {
    use super::{chain_data, crate_name};

    #[test]
    fn crate_name_is_stable() {
        assert_eq!(crate_name(), "kddn-bench");
    }

    #[test]
    fn chain_data_has_requested_shape() {
        let (data1, data2) = chain_data(1, 12, 5).expect("valid fixture");
        assert_eq!((data1.n_samples(), data1.n_vars()), (12, 5));
        assert_eq!((data2.n_samples(), data2.n_vars()), (12, 5));
    }
}
