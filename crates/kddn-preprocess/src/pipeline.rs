// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::selection::select_variables;
use crate::standardize::standardize;
use kddn_core::{ConditionMatrix, KddnError, VariableSet};
use tracing::debug;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Collapse repeated variable names onto their most significant column.
    pub deduplicate: bool,
    /// Center and scale every column to unit norm.
    pub standardize: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
            standardize: false,
        }
    }
}

/// What one preprocessing step did to the variable set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub vars_in: usize,
    pub vars_out: usize,
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessedData {
    pub variables: VariableSet,
    pub data1: ConditionMatrix,
    pub data2: ConditionMatrix,
    pub reports: Vec<StepReport>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreprocessPipeline {
    config: PreprocessConfig,
}

impl PreprocessPipeline {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn apply(
        &self,
        names: &[String],
        data1: &ConditionMatrix,
        data2: &ConditionMatrix,
    ) -> Result<PreprocessedData, KddnError> {
        if data1.n_vars() != names.len() || data2.n_vars() != names.len() {
            return Err(KddnError::invalid_input(format!(
                "variable count mismatch: {} names, {} and {} data columns",
                names.len(),
                data1.n_vars(),
                data2.n_vars()
            )));
        }

        let mut reports = vec![];
        let (names, mut data1, mut data2) = if self.config.deduplicate {
            let selection = select_variables(names, data1, data2)?;
            reports.push(StepReport {
                step: "variable_selection".to_string(),
                vars_in: names.len(),
                vars_out: selection.indices.len(),
                notes: vec![format!(
                    "duplicates_removed={}",
                    selection.duplicates_removed
                )],
            });
            (
                selection.select_names(names),
                data1.select_columns(&selection.indices)?,
                data2.select_columns(&selection.indices)?,
            )
        } else {
            (names.to_vec(), data1.clone(), data2.clone())
        };
        let variables = VariableSet::new(names)?;

        if self.config.standardize {
            data1 = standardize(&data1);
            data2 = standardize(&data2);
            reports.push(StepReport {
                step: "standardize".to_string(),
                vars_in: variables.len(),
                vars_out: variables.len(),
                notes: vec!["unit_norm=true".to_string()],
            });
        }

        debug!(
            p = variables.len(),
            n1 = data1.n_samples(),
            n2 = data2.n_samples(),
            "preprocessing finished"
        );

        Ok(PreprocessedData {
            variables,
            data1,
            data2,
            reports,
        })
    }
}

/// Variable selection with the default configuration; data stay unstandardized.
pub fn preprocess(
    names: &[String],
    data1: &ConditionMatrix,
    data2: &ConditionMatrix,
) -> Result<PreprocessedData, KddnError> {
    PreprocessPipeline::default().apply(names, data1, data2)
}
