// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::ConditionMatrix;

/// Centers a column and scales it to unit Euclidean norm.
///
/// A constant column has zero norm after centering and stays all zeros.
pub fn standardize_column(column: &mut [f64]) {
    if column.is_empty() {
        return;
    }
    let mean = column.iter().sum::<f64>() / column.len() as f64;
    for value in column.iter_mut() {
        *value -= mean;
    }
    let norm = column.iter().map(|value| value * value).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in column.iter_mut() {
            *value /= norm;
        }
    }
}

/// Returns a copy with every column centered and scaled to unit norm.
pub fn standardize(matrix: &ConditionMatrix) -> ConditionMatrix {
    let mut out = matrix.clone();
    for column in out.columns_mut() {
        standardize_column(column);
    }
    out
}
