// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{ConditionMatrix, KddnError};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

fn mean_and_variance(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let ss = sample.iter().map(|value| (value - mean).powi(2)).sum::<f64>();
    (mean, ss / (n - 1.0))
}

/// Two-sided p-value of Welch's unequal-variance t-test.
///
/// When both samples have zero variance the test degenerates: equal means
/// give `1`, different means give `0`.
pub fn welch_t_test(first: &[f64], second: &[f64]) -> Result<f64, KddnError> {
    if first.len() < 2 || second.len() < 2 {
        return Err(KddnError::invalid_input(format!(
            "welch t-test needs at least 2 samples per group; got {} and {}",
            first.len(),
            second.len()
        )));
    }

    let (mean1, var1) = mean_and_variance(first);
    let (mean2, var2) = mean_and_variance(second);
    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let se1 = var1 / n1;
    let se2 = var2 / n2;
    let se = se1 + se2;

    if se <= 0.0 {
        return Ok(if mean1 == mean2 { 1.0 } else { 0.0 });
    }

    let t = (mean1 - mean2) / se.sqrt();
    let df = se * se / (se1 * se1 / (n1 - 1.0) + se2 * se2 / (n2 - 1.0));
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|err| KddnError::numerical_issue(format!("student t with df={df}: {err}")))?;
    Ok((2.0 * dist.cdf(-t.abs())).clamp(0.0, 1.0))
}

/// Columns kept after duplicate-name filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSelection {
    /// Original column indices, in first-occurrence order of their names.
    pub indices: Vec<usize>,
    /// Welch p-value of each kept column.
    pub p_values: Vec<f64>,
    pub duplicates_removed: usize,
}

impl VariableSelection {
    /// Names of the kept columns.
    pub fn select_names(&self, names: &[String]) -> Vec<String> {
        self.indices.iter().map(|&index| names[index].clone()).collect()
    }
}

/// Keeps one column per variable name: the one whose two conditions differ
/// most by Welch p-value. Ties and undefined p-values keep the earliest.
pub fn select_variables(
    names: &[String],
    first: &ConditionMatrix,
    second: &ConditionMatrix,
) -> Result<VariableSelection, KddnError> {
    if names.len() != first.n_vars() || names.len() != second.n_vars() {
        return Err(KddnError::invalid_input(format!(
            "variable count mismatch: {} names, {} and {} data columns",
            names.len(),
            first.n_vars(),
            second.n_vars()
        )));
    }

    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(names.len());
    let mut indices = Vec::with_capacity(names.len());
    let mut p_values = Vec::with_capacity(names.len());

    for (col, name) in names.iter().enumerate() {
        let p_value = welch_t_test(first.column(col), second.column(col))?;
        match slots.entry(name.as_str()) {
            Entry::Occupied(slot) => {
                let slot = *slot.get();
                if p_values[slot] > p_value {
                    indices[slot] = col;
                    p_values[slot] = p_value;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(indices.len());
                indices.push(col);
                p_values.push(p_value);
            }
        }
    }

    Ok(VariableSelection {
        duplicates_removed: names.len() - indices.len(),
        indices,
        p_values,
    })
}
