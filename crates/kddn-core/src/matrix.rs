// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KddnError;
use std::collections::HashMap;

/// Ordered, unique variable names.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<String>", into = "Vec<String>"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableSet {
    names: Vec<String>,
    folded: HashMap<String, usize>,
}

impl VariableSet {
    pub fn new(names: Vec<String>) -> Result<Self, KddnError> {
        let mut seen = HashMap::with_capacity(names.len());
        let mut folded = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(KddnError::invalid_input(format!(
                    "variable name at index {index} is empty"
                )));
            }
            if let Some(previous) = seen.insert(name.as_str(), index) {
                return Err(KddnError::invalid_input(format!(
                    "duplicate variable name {name:?} at indices {previous} and {index}"
                )));
            }
            folded.insert(name.to_lowercase(), index);
        }
        Ok(Self { names, folded })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Case-insensitive lookup. Names that only differ by case resolve to the
    /// last of them.
    pub fn index_of_ignore_case(&self, name: &str) -> Option<usize> {
        self.folded.get(&name.to_lowercase()).copied()
    }
}

impl TryFrom<Vec<String>> for VariableSet {
    type Error = KddnError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<VariableSet> for Vec<String> {
    fn from(set: VariableSet) -> Self {
        set.names
    }
}

/// Samples × variables expression matrix stored column-major.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ConditionMatrixRepr", into = "ConditionMatrixRepr")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionMatrix {
    n_samples: usize,
    n_vars: usize,
    values: Vec<f64>,
}

impl ConditionMatrix {
    /// Builds a matrix from column-major values.
    pub fn from_column_major(
        n_samples: usize,
        n_vars: usize,
        values: Vec<f64>,
    ) -> Result<Self, KddnError> {
        let expected = n_samples.checked_mul(n_vars).ok_or_else(|| {
            KddnError::invalid_input(format!(
                "matrix size overflow: n_samples={n_samples}, n_vars={n_vars}"
            ))
        })?;
        if values.len() != expected {
            return Err(KddnError::invalid_input(format!(
                "matrix values length mismatch: got {}, expected {expected} ({n_samples} x {n_vars})",
                values.len()
            )));
        }
        if let Some(position) = values.iter().position(|value| !value.is_finite()) {
            return Err(KddnError::invalid_input(format!(
                "matrix value at sample {}, variable {} is not finite",
                position % n_samples.max(1),
                position / n_samples.max(1)
            )));
        }
        Ok(Self {
            n_samples,
            n_vars,
            values,
        })
    }

    /// Builds a matrix from sample rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, KddnError> {
        let n_samples = rows.len();
        let n_vars = rows.first().map_or(0, |row| row.as_ref().len());
        for (index, row) in rows.iter().enumerate() {
            if row.as_ref().len() != n_vars {
                return Err(KddnError::invalid_input(format!(
                    "row {index} has {} values, expected {n_vars}",
                    row.as_ref().len()
                )));
            }
        }
        let mut values = Vec::with_capacity(n_samples * n_vars);
        for col in 0..n_vars {
            values.extend(rows.iter().map(|row| row.as_ref()[col]));
        }
        Self::from_column_major(n_samples, n_vars, values)
    }

    /// Builds a matrix by evaluating `value(sample, variable)`.
    pub fn from_fn<F>(n_samples: usize, n_vars: usize, mut value: F) -> Result<Self, KddnError>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(n_samples * n_vars);
        for col in 0..n_vars {
            for row in 0..n_samples {
                values.push(value(row, col));
            }
        }
        Self::from_column_major(n_samples, n_vars, values)
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    pub fn get(&self, sample: usize, var: usize) -> f64 {
        self.values[var * self.n_samples + sample]
    }

    /// All samples of one variable.
    pub fn column(&self, var: usize) -> &[f64] {
        let start = var * self.n_samples;
        &self.values[start..start + self.n_samples]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_vars).map(move |var| self.column(var))
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.values.chunks_mut(self.n_samples.max(1))
    }

    /// Keeps the given variables in the given order.
    pub fn select_columns(&self, vars: &[usize]) -> Result<Self, KddnError> {
        let mut values = Vec::with_capacity(self.n_samples * vars.len());
        for &var in vars {
            if var >= self.n_vars {
                return Err(KddnError::invalid_input(format!(
                    "column index {var} out of bounds for {} variables",
                    self.n_vars
                )));
            }
            values.extend_from_slice(self.column(var));
        }
        Ok(Self {
            n_samples: self.n_samples,
            n_vars: vars.len(),
            values,
        })
    }
}

/// Serialized form of [`ConditionMatrix`]; decoding goes through
/// [`ConditionMatrix::from_column_major`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionMatrixRepr {
    pub n_samples: usize,
    pub n_vars: usize,
    pub values: Vec<f64>,
}

impl TryFrom<ConditionMatrixRepr> for ConditionMatrix {
    type Error = KddnError;

    fn try_from(repr: ConditionMatrixRepr) -> Result<Self, Self::Error> {
        Self::from_column_major(repr.n_samples, repr.n_vars, repr.values)
    }
}

impl From<ConditionMatrix> for ConditionMatrixRepr {
    fn from(matrix: ConditionMatrix) -> Self {
        Self {
            n_samples: matrix.n_samples,
            n_vars: matrix.n_vars,
            values: matrix.values,
        }
    }
}
